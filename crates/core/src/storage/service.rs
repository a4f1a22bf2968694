//! Storage service implementation using Apache OpenDAL.

use std::sync::Arc;

use bytes::Bytes;
use opendal::{ErrorKind, Metadata, Operator, services};
use tracing::{debug, info, warn};

use super::config::{AdapterConfig, StorageConfig, StorageProvider};
use super::error::StorageError;
use super::host::{DatedDirectories, ExistenceProbe, StorageHost, StoredFile};
use super::key::{case_variants, join_key};

/// Cache-Control sent with every upload: 30 days.
pub const UPLOAD_CACHE_CONTROL: &str = "max-age=2592000";

/// Options for [`StorageService::read`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Absolute URL previously returned by [`StorageService::save`].
    pub path: String,
}

impl ReadOptions {
    /// Read options for a URL.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// An object ready to be written to an HTTP response.
#[derive(Debug, Clone)]
pub struct ServedObject {
    /// Key the object was found under.
    pub key: String,
    /// Response headers derived from the object metadata.
    pub headers: Vec<(String, String)>,
    /// Object body.
    pub body: Bytes,
}

/// Storage service that stands in for local disk storage.
pub struct StorageService<H = DatedDirectories> {
    operator: Operator,
    config: AdapterConfig,
    provider_name: &'static str,
    host: H,
}

impl StorageService<DatedDirectories> {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        Self::with_host(config, DatedDirectories)
    }
}

impl<H: StorageHost> StorageService<H> {
    /// Create a new storage service with a custom naming host.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn with_host(config: StorageConfig, host: H) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        let adapter = config.adapter;

        info!(
            provider = config.provider.name(),
            bucket = %adapter.bucket,
            region = %adapter.region,
            path_prefix = %adapter.path_prefix,
            host = adapter.host().unwrap_or("<relative>"),
            private_storage = adapter.private_storage,
            has_secret_id = !adapter.secret_id.is_empty(),
            has_secret_key = !adapter.secret_key.is_empty(),
            debug = adapter.debug,
            "Storage adapter configured"
        );

        Ok(Self {
            operator,
            config: adapter,
            provider_name: config.provider.name(),
            host,
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Cos {
                endpoint,
                bucket,
                secret_id,
                secret_key,
            } => {
                let builder = services::Cos::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .secret_id(secret_id)
                    .secret_key(secret_key);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Upload a file and return the URL it will be reachable at.
    ///
    /// The unique name and the file bytes are produced concurrently; the name
    /// is lowercased before upload. In private mode without an asset host the
    /// URL is host-relative so reads get routed through [`Self::serve`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the temporary file cannot be read and
    /// [`StorageError::Upload`] if the object store rejects the write.
    pub async fn save(
        &self,
        file: &StoredFile,
        target_dir: Option<&str>,
    ) -> Result<String, StorageError> {
        let target_dir = target_dir.map_or_else(|| self.host.target_dir(), str::to_string);

        let (file_name, bytes) = tokio::join!(
            self.host.unique_file_name(self, file, &target_dir),
            tokio::fs::read(&file.path),
        );
        let bytes = bytes.map_err(|e| StorageError::read(&file.path, e))?;
        let file_name = file_name.to_lowercase();
        let key = join_key(&[self.config.path_prefix.as_str(), file_name.as_str()]);

        let capability = self.operator.info().full_capability();
        let mut write = self.operator.write_with(&key, bytes);
        if capability.write_with_content_type {
            write = write.content_type(&file.content_type);
        }
        if capability.write_with_cache_control {
            write = write.cache_control(UPLOAD_CACHE_CONTROL);
        }

        if let Err(e) = write.await {
            warn!(key = %key, error = %e, "Upload failed");
            return Err(StorageError::upload(key, e));
        }
        self.log_op("save", &key, "uploaded");

        Ok(self.asset_url(&file_name, &key))
    }

    /// Check if a file exists in storage.
    ///
    /// Any failure, not only a missing object, reports `false`.
    pub async fn exists(&self, file_name: &str, target_dir: &str) -> bool {
        let key = join_key(&[self.config.path_prefix.as_str(), target_dir, file_name]);
        let found = match self.operator.stat(&key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                debug!(key = %key, error = %e, "Existence check failed");
                false
            }
        };
        self.log_op("exists", &key, if found { "found" } else { "absent" });
        found
    }

    /// Delete a file from storage.
    ///
    /// Best effort: a missing object and a failed delete both report `false`.
    pub async fn delete(&self, file_name: &str, target_dir: Option<&str>) -> bool {
        let target_dir = target_dir.map_or_else(|| self.host.target_dir(), str::to_string);
        let key = join_key(&[self.config.path_prefix.as_str(), target_dir.as_str(), file_name]);
        if let Err(e) = self.operator.stat(&key).await {
            debug!(key = %key, error = %e, "Delete target missing");
            self.log_op("delete", &key, "absent");
            return false;
        }
        match self.operator.delete(&key).await {
            Ok(()) => {
                self.log_op("delete", &key, "deleted");
                true
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Delete failed");
                self.log_op("delete", &key, "failed");
                false
            }
        }
    }

    /// Read back the raw bytes behind a URL returned by [`Self::save`].
    ///
    /// Only absolute URLs under this adapter's host are accepted. Without a
    /// host (private mode, no asset host) every path is rejected; those
    /// objects are reachable through [`Self::serve`] only.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotManaged`] for foreign paths and
    /// [`StorageError::Fetch`] if the object cannot be fetched.
    pub async fn read(&self, options: &ReadOptions) -> Result<Bytes, StorageError> {
        let path = options.path.trim_end_matches(['/', '\\']);

        let rest = self
            .config
            .host()
            .and_then(|host| path.strip_prefix(host))
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| StorageError::not_managed(path))?;
        let key = rest.trim_start_matches('/');

        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::fetch(key, e))?;
        self.log_op("read", key, "fetched");
        Ok(buffer.to_bytes())
    }

    /// A reusable request handler bound to this service.
    #[must_use]
    pub fn serve(self: &Arc<Self>) -> ServeHandler<H> {
        ServeHandler {
            service: Arc::clone(self),
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    /// Get the underlying OpenDAL operator.
    #[must_use]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Get the resolved adapter configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn asset_url(&self, file_name: &str, key: &str) -> String {
        match self.config.host() {
            Some(host) => format!("{host}/{key}"),
            None if self.config.path_prefix.is_empty() => format!("/{file_name}"),
            None => format!("/{}/{file_name}", self.config.path_prefix),
        }
    }

    async fn fetch(&self, key: &str) -> Result<ServedObject, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::fetch(key, e))?;
        let body = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::fetch(key, e))?
            .to_bytes();

        Ok(ServedObject {
            key: key.to_string(),
            headers: response_headers(&meta, body.len()),
            body,
        })
    }

    fn log_op(&self, op: &'static str, key: &str, outcome: &'static str) {
        if self.config.debug {
            info!(op, key = %key, outcome, "Storage operation");
        } else {
            debug!(op, key = %key, outcome, "Storage operation");
        }
    }
}

impl<H: StorageHost> ExistenceProbe for StorageService<H> {
    fn exists(
        &self,
        file_name: &str,
        target_dir: &str,
    ) -> impl std::future::Future<Output = bool> + Send {
        StorageService::exists(self, file_name, target_dir)
    }
}

/// Request handler returned by [`StorageService::serve`].
///
/// Cheap to clone; every clone shares the same service.
pub struct ServeHandler<H = DatedDirectories> {
    service: Arc<StorageService<H>>,
}

impl<H> Clone for ServeHandler<H> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<H: StorageHost> ServeHandler<H> {
    /// Resolve a request path to an object.
    ///
    /// The path is taken relative to the path prefix. When the exact key
    /// cannot be fetched, case variants of the file name are probed in order
    /// and the first hit is served.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] for an object without a body, and
    /// the original fetch error when no variant exists. OpenDAL reports a
    /// missing body as zero bytes, so zero-length objects are never served
    /// even though [`StorageService::exists`] reports them.
    pub async fn handle(&self, request_path: &str) -> Result<ServedObject, StorageError> {
        let service = &self.service;
        let key = join_key(&[service.config.path_prefix.as_str(), request_path]);

        let original = match service.fetch(&key).await {
            Ok(object) => return non_empty(object),
            Err(e) => e,
        };

        for candidate in case_variants(&key) {
            if service.operator.stat(&candidate).await.is_ok() {
                service.log_op("serve", &candidate, "case fallback hit");
                return non_empty(service.fetch(&candidate).await?);
            }
        }

        service.log_op("serve", &key, "not found");
        Err(original)
    }
}

fn non_empty(object: ServedObject) -> Result<ServedObject, StorageError> {
    if object.body.is_empty() {
        Err(StorageError::not_found(object.key))
    } else {
        Ok(object)
    }
}

/// Response headers for an object, taken from its metadata.
fn response_headers(meta: &Metadata, body_len: usize) -> Vec<(String, String)> {
    let mut headers = vec![("content-length".to_string(), body_len.to_string())];
    let optional = [
        ("content-type", meta.content_type()),
        ("etag", meta.etag()),
        ("cache-control", meta.cache_control()),
        ("content-disposition", meta.content_disposition()),
        ("content-encoding", meta.content_encoding()),
    ];
    headers.extend(
        optional
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.to_string()))),
    );
    headers
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
