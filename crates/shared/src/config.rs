//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the serve handler is mounted under. Derived from the path prefix when unset.
    #[serde(default)]
    pub mount_path: Option<String>,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            mount_path: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2368
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

/// Which storage service backs the adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Tencent Cloud COS.
    #[default]
    Cos,
    /// Local filesystem (development only).
    LocalFs,
    /// In-memory store (tests and demos).
    Memory,
}

/// Storage settings as read from config files.
///
/// Every field is optional: the adapter resolves each one against its `COS_*`
/// environment variable first and only then falls back to the value here.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage backend.
    pub backend: StorageBackend,
    /// Root directory for the `local_fs` backend.
    pub local_root: Option<PathBuf>,
    /// API secret id.
    pub secret_id: Option<String>,
    /// API secret key.
    pub secret_key: Option<String>,
    /// Bucket name, including the app id suffix.
    pub bucket: Option<String>,
    /// Bucket region, e.g. `ap-guangzhou`.
    pub region: Option<String>,
    /// Subdirectory prefix for every object key.
    pub path_prefix: Option<String>,
    /// Custom domain used to build public URLs.
    pub domain: Option<String>,
    /// URL scheme, e.g. `https:`.
    pub protocol: Option<String>,
    /// Route reads through the serve handler instead of direct URLs.
    pub private_storage: Option<bool>,
    /// Explicit asset host overriding the computed one.
    pub asset_host: Option<String>,
    /// Verbose operation logging.
    pub debug: Option<bool>,
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("backend", &self.backend)
            .field("local_root", &self.local_root)
            .field("has_secret_id", &self.secret_id.is_some())
            .field("has_secret_key", &self.secret_key.is_some())
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("path_prefix", &self.path_prefix)
            .field("domain", &self.domain)
            .field("protocol", &self.protocol)
            .field("private_storage", &self.private_storage)
            .field("asset_host", &self.asset_host)
            .field("debug", &self.debug)
            .finish()
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COSGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
