//! Configuration management for aimpact.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::crypto::ReportCipher;
use crate::error::{Error, Result};
use crate::storage::RetentionPolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "aimpact";

/// Default reference data file name.
const REFERENCE_FILE_NAME: &str = "reference-data.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AIMPACT_`, `__` between sections)
/// 2. TOML config file at `~/.config/aimpact/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Blob storage configuration.
    pub storage: StorageConfig,
    /// Reference data configuration.
    pub reference: ReferenceConfig,
    /// Report form configuration.
    pub form: FormConfig,
    /// Upload client configuration.
    pub client: ClientConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_address: String,
    /// Base URL used when building blob URLs in upload responses.
    /// Empty means relative URLs.
    pub public_base_url: String,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

/// Blob retention configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum age of blobs in hours.
    /// Set to 0 for unlimited.
    pub max_age_hours: u32,
    /// Maximum number of blobs to retain.
    /// Set to 0 for unlimited.
    pub max_blobs: usize,
    /// Minutes between cleanup runs.
    pub cleanup_interval_minutes: u32,
}

/// Reference data configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Path to the reference data JSON document.
    /// Defaults to `~/.local/share/aimpact/reference-data.json`
    pub path: Option<PathBuf>,
}

/// Report form configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// How long the success state is shown before redirecting.
    pub success_redirect_ms: u64,
    /// Where to navigate after a successful save or submit.
    pub redirect_target: String,
}

/// Upload client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the aimpact server.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Key fragment used to encrypt reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_fragment: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            public_base_url: String::new(),
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 0,
            max_blobs: 0,
            cleanup_interval_minutes: 60,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            success_redirect_ms: 3000,
            redirect_target: "/".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 30,
            key_fragment: None,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("AIMPACT_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid bind_address: {}", self.server.bind_address),
            });
        }

        if self.server.max_upload_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_upload_bytes must be greater than 0".to_string(),
            });
        }

        if self.storage.cleanup_interval_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "cleanup_interval_minutes must be greater than 0".to_string(),
            });
        }

        if self.form.success_redirect_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "success_redirect_ms must be greater than 0".to_string(),
            });
        }

        if self.client.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Some(fragment) = &self.client.key_fragment {
            ReportCipher::import(fragment).map_err(|e| Error::ConfigValidation {
                message: format!("key_fragment: {e}"),
            })?;
        }

        Ok(())
    }

    /// Get the reference data path, resolving defaults if not set.
    #[must_use]
    pub fn reference_path(&self) -> PathBuf {
        self.reference
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(REFERENCE_FILE_NAME))
    }

    /// Get the blob retention policy.
    #[must_use]
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_age: (self.storage.max_age_hours > 0)
                .then(|| chrono::Duration::hours(i64::from(self.storage.max_age_hours))),
            max_blobs: (self.storage.max_blobs > 0).then_some(self.storage.max_blobs),
        }
    }

    /// Get the cleanup interval as a Duration.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.storage.cleanup_interval_minutes) * 60)
    }

    /// Get the success redirect delay as a Duration.
    #[must_use]
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.form.success_redirect_ms)
    }

    /// Get the client request timeout as a Duration.
    #[must_use]
    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs)
    }
}
