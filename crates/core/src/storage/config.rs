//! Storage configuration types.
//!
//! [`AdapterConfig`] is resolved once at construction: each field is read from
//! its `COS_*` environment variable, then from [`StorageSettings`], then from a
//! hardcoded default. Resolution performs no I/O beyond the injected lookup.

use std::fmt;
use std::path::PathBuf;

use cosgate_shared::{StorageBackend, StorageSettings};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Default public domain of the COS service.
pub const COS_DEFAULT_DOMAIN: &str = "myqcloud.com";

/// Default URL scheme.
pub const DEFAULT_PROTOCOL: &str = "https:";

/// Environment variable names, checked before config-file values.
pub mod env {
    /// API secret id.
    pub const SECRET_ID: &str = "COS_SECRET_ID";
    /// API secret key.
    pub const SECRET_KEY: &str = "COS_SECRET_KEY";
    /// Bucket name.
    pub const BUCKET: &str = "COS_BUCKET";
    /// Bucket region.
    pub const REGION: &str = "COS_REGION";
    /// Explicit asset host.
    pub const ASSET_HOST: &str = "COS_ASSET_HOST";
    /// Key path prefix.
    pub const PATH_PREFIX: &str = "COS_PATH_PREFIX";
    /// Custom domain.
    pub const DOMAIN: &str = "COS_DOMAIN";
    /// URL scheme.
    pub const PROTOCOL: &str = "COS_PROTOCOL";
    /// Private storage flag.
    pub const PRIVATE_STORAGE: &str = "COS_PRIVATE_STORAGE";
    /// Debug logging flag.
    pub const DEBUG: &str = "COS_DEBUG";
}

/// Storage provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Tencent Cloud Object Storage.
    Cos {
        /// COS service endpoint URL.
        endpoint: String,
        /// Bucket name, including the app id suffix.
        bucket: String,
        /// API secret id.
        secret_id: String,
        /// API secret key.
        secret_key: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-memory store (tests and demos)
    Memory,
}

impl StorageProvider {
    /// Create a COS provider for a bucket in the given region.
    #[must_use]
    pub fn cos(
        bucket: impl Into<String>,
        region: &str,
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self::Cos {
            endpoint: format!("https://cos.{region}.{COS_DEFAULT_DOMAIN}"),
            bucket: bucket.into(),
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cos { .. } => "cos",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cos {
                endpoint, bucket, ..
            } => f
                .debug_struct("Cos")
                .field("endpoint", endpoint)
                .field("bucket", bucket)
                .finish_non_exhaustive(),
            Self::LocalFs { root } => f.debug_struct("LocalFs").field("root", root).finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Resolved, immutable adapter configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// API secret id.
    pub secret_id: String,
    /// API secret key.
    pub secret_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Bucket region.
    pub region: String,
    /// Key prefix, without leading or trailing slashes.
    pub path_prefix: String,
    /// Custom domain, empty when unset.
    pub domain: String,
    /// URL scheme, always ending in `:`.
    pub protocol: String,
    /// Private storage mode.
    pub private_storage: bool,
    /// Explicit asset host, if configured and non-blank.
    pub asset_host: Option<String>,
    /// Verbose operation logging.
    pub debug: bool,
    host: Option<String>,
}

impl AdapterConfig {
    /// Resolve configuration against the process environment.
    #[must_use]
    pub fn from_env(settings: &StorageSettings) -> Self {
        Self::resolve(settings, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    ///
    /// Blank environment values count as unset.
    #[must_use]
    pub fn resolve<F>(settings: &StorageSettings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, fallback: Option<&String>| -> Option<String> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| fallback.cloned())
        };
        let flag = |name: &str, fallback: Option<bool>| -> bool {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map_or(fallback.unwrap_or(false), |v| parse_flag(&v))
        };

        let protocol = var(env::PROTOCOL, settings.protocol.as_ref())
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
        let protocol = if protocol.ends_with(':') {
            protocol
        } else {
            format!("{protocol}:")
        };

        let mut config = Self {
            secret_id: var(env::SECRET_ID, settings.secret_id.as_ref()).unwrap_or_default(),
            secret_key: var(env::SECRET_KEY, settings.secret_key.as_ref()).unwrap_or_default(),
            bucket: var(env::BUCKET, settings.bucket.as_ref()).unwrap_or_default(),
            region: var(env::REGION, settings.region.as_ref()).unwrap_or_default(),
            path_prefix: var(env::PATH_PREFIX, settings.path_prefix.as_ref())
                .map(|p| p.trim().trim_matches('/').to_string())
                .unwrap_or_default(),
            domain: var(env::DOMAIN, settings.domain.as_ref())
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            protocol,
            private_storage: flag(env::PRIVATE_STORAGE, settings.private_storage),
            asset_host: var(env::ASSET_HOST, settings.asset_host.as_ref())
                .map(|h| h.trim().trim_end_matches('/').to_string())
                .filter(|h| !h.is_empty()),
            debug: flag(env::DEBUG, settings.debug),
            host: None,
        };
        config.host = config.compute_host();
        config
    }

    /// The asset host used for absolute URLs.
    ///
    /// `None` only in private mode without an explicit asset host; saves then
    /// return relative URLs and reads must go through the serve handler.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Whether saves return host-relative URLs.
    #[must_use]
    pub fn uses_relative_urls(&self) -> bool {
        self.host.is_none()
    }

    fn compute_host(&self) -> Option<String> {
        if let Some(host) = &self.asset_host {
            return Some(host.clone());
        }
        if self.private_storage {
            return None;
        }
        if self.domain.is_empty() {
            Some(format!(
                "{}//{}.cos.{}.{COS_DEFAULT_DOMAIN}",
                self.protocol, self.bucket, self.region
            ))
        } else {
            Some(format!("{}//{}", self.protocol, self.domain))
        }
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("has_secret_id", &!self.secret_id.is_empty())
            .field("has_secret_key", &!self.secret_key.is_empty())
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("path_prefix", &self.path_prefix)
            .field("domain", &self.domain)
            .field("protocol", &self.protocol)
            .field("private_storage", &self.private_storage)
            .field("asset_host", &self.asset_host)
            .field("debug", &self.debug)
            .field("host", &self.host)
            .finish()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Resolved adapter configuration.
    pub adapter: AdapterConfig,
}

impl StorageConfig {
    /// Create a storage config from a provider and a resolved adapter config.
    #[must_use]
    pub fn new(provider: StorageProvider, adapter: AdapterConfig) -> Self {
        Self { provider, adapter }
    }

    /// Create a COS-backed config from the adapter's own credentials.
    #[must_use]
    pub fn cos(adapter: AdapterConfig) -> Self {
        let provider = StorageProvider::cos(
            adapter.bucket.clone(),
            &adapter.region,
            adapter.secret_id.clone(),
            adapter.secret_key.clone(),
        );
        Self::new(provider, adapter)
    }

    /// Build the config for the backend selected in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `local_fs` backend has no root directory.
    pub fn from_settings(
        settings: &StorageSettings,
        adapter: AdapterConfig,
    ) -> Result<Self, StorageError> {
        match settings.backend {
            StorageBackend::Cos => Ok(Self::cos(adapter)),
            StorageBackend::LocalFs => {
                let root = settings
                    .local_root
                    .clone()
                    .ok_or_else(|| StorageError::configuration("local_fs backend needs local_root"))?;
                Ok(Self::new(StorageProvider::local_fs(root), adapter))
            }
            StorageBackend::Memory => Ok(Self::new(StorageProvider::Memory, adapter)),
        }
    }
}
