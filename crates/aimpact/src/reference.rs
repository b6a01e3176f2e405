//! Reference data for the report form.
//!
//! The dropdown values (platforms, SDLC steps and tasks, categories, ...)
//! live in a single JSON object on disk. Whole-document writes replace it;
//! category writes merge into the existing category.

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A reference data document: category name to value.
pub type ReferenceDocument = Map<String, Value>;

/// The document used when no file exists yet.
#[must_use]
pub fn default_document() -> ReferenceDocument {
    let value = json!({
        "platforms": ["Web", "Mobile", "Backend", "Data", "Infrastructure"],
        "sdlcSteps": {
            "Planning": ["Requirements gathering", "Estimation", "Backlog grooming"],
            "Design": ["Architecture", "API design", "UI design"],
            "Development": ["Coding", "Refactoring", "Code review", "Documentation"],
            "Testing": ["Unit tests", "Integration tests", "Test planning"],
            "Deployment": ["CI/CD", "Release notes", "Infrastructure as code"],
            "Maintenance": ["Bug fixing", "Incident analysis", "Dependency upgrades"]
        },
        "categories": ["Feature", "Bug fix", "Technical debt", "Research", "Support"],
        "complexities": ["Low", "Medium", "High"],
        "qualityImpacts": ["Improved", "No change", "Degraded"],
        "tools": ["ChatGPT", "Claude", "GitHub Copilot", "Cursor", "Gemini"]
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// File-backed reference data store.
#[derive(Debug)]
pub struct ReferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ReferenceStore {
    /// Create a store for the document at `path`.
    ///
    /// Nothing is read or written until the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    ///
    /// A missing file yields the built-in default document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub async fn load(&self) -> Result<ReferenceDocument> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No reference data at {}, using defaults", self.path.display());
                return Ok(default_document());
            }
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice::<Value>(&raw).map_err(|e| {
            Error::internal(format!(
                "reference data at {} is not valid JSON: {e}",
                self.path.display()
            ))
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::internal(format!(
                "reference data at {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Write the default document if the file does not exist yet.
    ///
    /// Returns `true` if a file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn ensure_seeded(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        self.write(&default_document()).await?;
        info!("Seeded reference data at {}", self.path.display());
        Ok(true)
    }

    /// Replace the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReferenceData`] if `value` is not a JSON object,
    /// or an I/O error if the file cannot be written.
    pub async fn replace(&self, value: Value) -> Result<ReferenceDocument> {
        let Value::Object(doc) = value else {
            return Err(Error::invalid_reference_data(
                "reference data must be a JSON object",
            ));
        };
        let _guard = self.write_lock.lock().await;
        self.write(&doc).await?;
        info!("Replaced reference data ({} categories)", doc.len());
        Ok(doc)
    }

    /// Read one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read.
    pub async fn category(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.load().await?.remove(name))
    }

    /// Update one existing category.
    ///
    /// Object values are merged key by key into the current object; any other
    /// value replaces the category. Returns the new category value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CategoryNotFound`] if the category does not exist, or an
    /// I/O error if the document cannot be read or written.
    pub async fn update_category(&self, name: &str, value: Value) -> Result<Value> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let Some(current) = doc.get_mut(name) else {
            return Err(Error::CategoryNotFound {
                name: name.to_string(),
            });
        };

        match (current, value) {
            (Value::Object(existing), Value::Object(update)) => {
                for (key, v) in update {
                    existing.insert(key, v);
                }
            }
            (current, value) => *current = value,
        }

        let updated = doc.get(name).cloned().unwrap_or(Value::Null);
        self.write(&doc).await?;
        debug!(category = name, "updated reference data category");
        Ok(updated)
    }

    /// Write through a temporary file and rename.
    async fn write(&self, doc: &ReferenceDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let body = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
