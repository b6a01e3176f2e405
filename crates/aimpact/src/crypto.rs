//! AES-GCM encryption of report payloads.
//!
//! A key fragment is the URL-safe base64 encoding of a raw 128- or 256-bit
//! key. Encrypted blobs are laid out as `IV (12 bytes) || ciphertext`, where
//! the ciphertext carries the 16-byte GCM tag at its end.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Length of the AES-GCM initialization vector.
pub const IV_LEN: usize = 12;

/// Length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

/// Symmetric cipher imported from a key fragment.
pub struct ReportCipher {
    cipher: Cipher,
}

impl fmt::Debug for ReportCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportCipher")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl ReportCipher {
    /// Import a cipher from a URL-safe base64 key fragment.
    ///
    /// Leading `#` (as found in URL fragments) and surrounding whitespace are
    /// ignored. Padding is optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyImport`] when the fragment is not valid base64 or
    /// does not decode to 16 or 32 bytes.
    pub fn import(fragment: &str) -> Result<Self> {
        let trimmed = fragment.trim().trim_start_matches('#');
        if trimmed.is_empty() {
            return Err(Error::key_import("key fragment is empty"));
        }
        let engine = if trimmed.ends_with('=') {
            &URL_SAFE
        } else {
            &URL_SAFE_NO_PAD
        };
        let mut raw = engine
            .decode(trimmed.as_bytes())
            .map_err(|e| Error::key_import(format!("invalid base64: {e}")))?;
        let cipher = Self::from_key_bytes(&raw);
        raw.zeroize();
        cipher
    }

    /// Build a cipher from raw key bytes (16 or 32 bytes).
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyImport`] for any other key length.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self> {
        let cipher = match key.len() {
            16 => Cipher::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(|e| Error::key_import(e.to_string()))?,
            )),
            32 => Cipher::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(|e| Error::key_import(e.to_string()))?,
            )),
            n => {
                return Err(Error::key_import(format!(
                    "expected 16 or 32 key bytes, got {n}"
                )))
            }
        };
        Ok(Self { cipher })
    }

    /// Name of the imported algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        match self.cipher {
            Cipher::Aes128(_) => "AES-128-GCM",
            Cipher::Aes256(_) => "AES-256-GCM",
        }
    }

    /// Encrypt a plaintext under a fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encryption`] if the AEAD primitive fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedBlob> {
        let (iv, ciphertext) = match &self.cipher {
            Cipher::Aes128(c) => {
                let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
                let ct = c.encrypt(&nonce, plaintext);
                (nonce, ct)
            }
            Cipher::Aes256(c) => {
                let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
                let ct = c.encrypt(&nonce, plaintext);
                (nonce, ct)
            }
        };
        let ciphertext = ciphertext.map_err(|e| Error::Encryption(e.to_string()))?;
        let mut iv_bytes = [0u8; IV_LEN];
        iv_bytes.copy_from_slice(iv.as_slice());
        Ok(EncryptedBlob {
            iv: iv_bytes,
            ciphertext,
        })
    }

    /// Decrypt a blob produced by [`ReportCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decryption`] on a wrong key or tampered data.
    pub fn decrypt(&self, blob: &EncryptedBlob) -> Result<Vec<u8>> {
        let nonce = Nonce::from_slice(&blob.iv);
        let plaintext = match &self.cipher {
            Cipher::Aes128(c) => c.decrypt(nonce, blob.ciphertext.as_slice()),
            Cipher::Aes256(c) => c.decrypt(nonce, blob.ciphertext.as_slice()),
        };
        plaintext.map_err(|e| Error::Decryption(e.to_string()))
    }

    /// Decrypt a raw `IV || ciphertext` buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decryption`] if the buffer is malformed or does not
    /// authenticate.
    pub fn decrypt_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(&EncryptedBlob::from_bytes(bytes)?)
    }
}

/// An IV together with the ciphertext it was used for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// Initialization vector.
    pub iv: [u8; IV_LEN],
    /// Ciphertext including the GCM tag.
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Concatenate IV and ciphertext into one buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a buffer into IV and ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decryption`] if the buffer cannot hold an IV and a tag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < IV_LEN + TAG_LEN {
            return Err(Error::Decryption(format!(
                "blob of {} bytes is shorter than IV and tag",
                bytes.len()
            )));
        }
        let (iv, ciphertext) = bytes.split_at(IV_LEN);
        let mut iv_bytes = [0u8; IV_LEN];
        iv_bytes.copy_from_slice(iv);
        Ok(Self {
            iv: iv_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Generate a new random 256-bit key fragment.
#[must_use]
pub fn generate_key_fragment() -> String {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    let fragment = URL_SAFE_NO_PAD.encode(key);
    key.zeroize();
    fragment
}
