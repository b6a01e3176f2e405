//! Blob identifiers.
//!
//! An id is the creation time in milliseconds written in base 36, a dash,
//! and ten random base-36 characters, e.g. `m5x2k1q0-4f9zq0a7bc`.

use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 10;

static BLOB_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-z]{1,13}-[0-9a-z]{10}$").expect("blob id pattern is valid")
});

/// Identifier of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    /// Generate a new id for the given creation time.
    #[must_use]
    pub fn generate(now_ms: i64) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        Self(format!("{}-{suffix}", to_base36(now_ms.max(0).unsigned_abs())))
    }

    /// Validate and wrap an id received from outside.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBlobId`] if the string does not look like an id.
    pub fn parse(raw: &str) -> Result<Self> {
        if BLOB_ID_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidBlobId(raw.chars().take(64).collect()))
        }
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        // n % 36 < 36, so the index is in bounds.
        #[allow(clippy::cast_possible_truncation)]
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
