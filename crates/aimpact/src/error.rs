//! Error types for aimpact.
//!
//! This module defines all error types used throughout the aimpact crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for aimpact operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Crypto Errors ===
    /// The key fragment could not be turned into an encryption key.
    #[error("failed to import key: {message}")]
    KeyImport {
        /// Why the fragment was rejected.
        message: String,
    },

    /// Encrypting a report payload failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decrypting a blob failed (wrong key, truncated or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    // === Transport Errors ===
    /// The upload endpoint could not be reached or rejected the request.
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// Description of what went wrong.
        message: String,
    },

    // === Form Errors ===
    /// The form refused to save or submit.
    #[error("report cannot be sent: {reason}")]
    FormRejected {
        /// Why the form refused.
        reason: String,
    },

    // === Storage Errors ===
    /// A blob identifier did not have the expected shape.
    #[error("invalid blob id: {0}")]
    InvalidBlobId(String),

    /// An upload exceeded the configured size limit.
    #[error("upload exceeds limit of {limit} bytes")]
    BlobTooLarge {
        /// Configured limit.
        limit: usize,
    },

    // === Reference Data Errors ===
    /// The named reference-data category does not exist.
    #[error("reference data category '{name}' not found")]
    CategoryNotFound {
        /// Requested category name.
        name: String,
    },

    /// A reference-data document or category body was malformed.
    #[error("invalid reference data: {message}")]
    InvalidReferenceData {
        /// Description of the problem.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for aimpact operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                operation: "HTTP request".to_string(),
            };
        }
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a key import error.
    #[must_use]
    pub fn key_import(message: impl Into<String>) -> Self {
        Self::KeyImport {
            message: message.into(),
        }
    }

    /// Create a transport error without an HTTP status.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport error for a non-success HTTP status.
    #[must_use]
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create an invalid reference data error.
    #[must_use]
    pub fn invalid_reference_data(message: impl Into<String>) -> Self {
        Self::InvalidReferenceData {
            message: message.into(),
        }
    }

    /// Check if this error means the requested resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CategoryNotFound { .. })
    }

    /// Check if this error was caused by bad input rather than a server fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBlobId(_)
                | Self::FormRejected { .. }
                | Self::BlobTooLarge { .. }
                | Self::InvalidReferenceData { .. }
                | Self::Json(_)
        )
    }
}
