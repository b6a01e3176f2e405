//! Blob storage for aimpact.
//!
//! An in-process map from generated [`BlobId`]s to opaque encrypted buffers.
//! Nothing is persisted: the store lives as long as the server process. By
//! default every blob is kept; an opt-in retention policy can bound the age
//! and the number of entries, and a periodic cleanup task applies it.

pub mod id;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use id::BlobId;

use crate::error::{Error, Result};
use crate::report::ReportStatus;

/// Metadata recorded with an uploaded blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    /// Report thread the blob belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Author of the report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Draft or submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
}

/// A blob held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Identifier.
    pub id: BlobId,
    /// When the blob was stored.
    pub created_at: DateTime<Utc>,
    /// BLAKE3 hash of the bytes.
    pub content_hash: String,
    /// Upload metadata.
    pub metadata: BlobMetadata,
    /// The opaque bytes (IV || ciphertext for report uploads).
    pub bytes: Arc<[u8]>,
}

impl StoredBlob {
    /// Size of the stored bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check the bytes against the recorded hash.
    #[must_use]
    pub fn verify(&self) -> bool {
        blake3::hash(&self.bytes).to_hex().as_str() == self.content_hash
    }
}

/// How long and how many blobs are kept.
///
/// The default keeps everything for the life of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum age; `None` keeps blobs forever.
    pub max_age: Option<Duration>,
    /// Maximum number of blobs; `None` means unbounded.
    pub max_blobs: Option<usize>,
}

impl RetentionPolicy {
    /// A policy that never removes anything.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_age: None,
            max_blobs: None,
        }
    }

    /// Whether the policy ever removes anything.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.max_age.is_some() || self.max_blobs.is_some()
    }
}

/// In-memory blob store.
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
#[derive(Debug, Default)]
pub struct BlobStore {
    blobs: RwLock<HashMap<BlobId, StoredBlob>>,
    retention: RetentionPolicy,
}

impl BlobStore {
    /// Create an empty store with the given retention policy.
    #[must_use]
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// The retention policy in effect.
    #[must_use]
    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<BlobId, StoredBlob>>> {
        self.blobs
            .read()
            .map_err(|_| Error::internal("blob store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<BlobId, StoredBlob>>> {
        self.blobs
            .write()
            .map_err(|_| Error::internal("blob store lock poisoned"))
    }

    /// Store a buffer and return its new identifier.
    ///
    /// When the store is at its size limit the oldest blobs are evicted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn store(&self, bytes: impl Into<Arc<[u8]>>, metadata: BlobMetadata) -> Result<BlobId> {
        let bytes = bytes.into();
        let created_at = Utc::now();
        let content_hash = blake3::hash(&bytes).to_hex().to_string();

        let mut blobs = self.write()?;
        let mut id = BlobId::generate(created_at.timestamp_millis());
        while blobs.contains_key(&id) {
            id = BlobId::generate(created_at.timestamp_millis());
        }

        // Make room first so the new blob is never the one evicted.
        if let Some(max) = self.retention.max_blobs {
            let evicted = evict_oldest(&mut blobs, max.saturating_sub(1));
            if evicted > 0 {
                info!("Evicted {} blobs to stay within {} entries", evicted, max);
            }
        }

        debug!(id = %id, size = bytes.len(), "storing blob");
        blobs.insert(
            id.clone(),
            StoredBlob {
                id: id.clone(),
                created_at,
                content_hash,
                metadata,
                bytes,
            },
        );
        Ok(id)
    }

    /// Get a blob by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned or the bytes no longer
    /// match their recorded hash.
    pub fn get(&self, id: &BlobId) -> Result<Option<StoredBlob>> {
        let Some(blob) = self.read()?.get(id).cloned() else {
            return Ok(None);
        };
        if !blob.verify() {
            warn!(id = %id, "blob failed integrity check");
            return Err(Error::internal(format!("blob {id} failed integrity check")));
        }
        Ok(Some(blob))
    }

    /// Delete a blob by id.
    ///
    /// Returns `true` if a blob was deleted, `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn delete(&self, id: &BlobId) -> Result<bool> {
        let removed = self.write()?.remove(id).is_some();
        if removed {
            debug!(id = %id, "deleted blob");
        }
        Ok(removed)
    }

    /// Number of stored blobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Remove blobs older than `max_age`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn prune_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_age;
        let mut blobs = self.write()?;
        let before = blobs.len();
        blobs.retain(|_, blob| blob.created_at >= cutoff);
        let pruned = before - blobs.len();
        if pruned > 0 {
            info!("Pruned {} expired blobs", pruned);
        }
        Ok(pruned)
    }

    /// Keep only the `keep_count` most recent blobs. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn prune_keep_recent(&self, keep_count: usize) -> Result<usize> {
        let mut blobs = self.write()?;
        let pruned = evict_oldest(&mut blobs, keep_count);
        if pruned > 0 {
            info!("Pruned {} blobs to keep {} recent", pruned, keep_count);
        }
        Ok(pruned)
    }

    /// Apply the retention policy once. Returns how many blobs were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn apply_retention(&self) -> Result<usize> {
        let mut pruned = 0;
        if let Some(max_age) = self.retention.max_age {
            pruned += self.prune_older_than(max_age)?;
        }
        if let Some(max_blobs) = self.retention.max_blobs {
            pruned += self.prune_keep_recent(max_blobs)?;
        }
        Ok(pruned)
    }

    /// Summary statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn stats(&self) -> Result<StorageStats> {
        let blobs = self.read()?;
        Ok(StorageStats {
            total_blobs: blobs.len(),
            total_bytes: blobs.values().map(|b| b.bytes.len() as u64).sum(),
            oldest_blob: blobs.values().map(|b| b.created_at).min(),
            newest_blob: blobs.values().map(|b| b.created_at).max(),
        })
    }
}

/// Remove the oldest entries until at most `keep` remain.
fn evict_oldest(blobs: &mut HashMap<BlobId, StoredBlob>, keep: usize) -> usize {
    if blobs.len() <= keep {
        return 0;
    }
    let mut by_age: Vec<(DateTime<Utc>, BlobId)> = blobs
        .values()
        .map(|b| (b.created_at, b.id.clone()))
        .collect();
    by_age.sort();
    let excess = blobs.len() - keep;
    for (_, id) in by_age.into_iter().take(excess) {
        blobs.remove(&id);
    }
    excess
}

/// Start the periodic cleanup task.
///
/// The first run happens one `interval` after start-up.
#[must_use]
pub fn spawn_cleanup(store: Arc<BlobStore>, interval: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            match store.apply_retention() {
                Ok(pruned) => debug!(pruned, "blob cleanup finished"),
                Err(e) => warn!("blob cleanup failed: {e}"),
            }
        }
    })
}

/// Statistics about the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Number of blobs stored.
    pub total_blobs: usize,
    /// Sum of blob sizes in bytes.
    pub total_bytes: u64,
    /// Creation time of the oldest blob.
    pub oldest_blob: Option<DateTime<Utc>>,
    /// Creation time of the newest blob.
    pub newest_blob: Option<DateTime<Utc>>,
}
