//! Storage error types.

use std::path::{Path, PathBuf};

use cosgate_shared::AppError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The local temporary file could not be read.
    #[error("failed to read upload {path}: {source}")]
    Read {
        /// Temporary file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Upload to the object store failed.
    #[error("failed to upload {key}: {source}")]
    Upload {
        /// Object key being written.
        key: String,
        /// Transport error, unchanged.
        #[source]
        source: opendal::Error,
    },

    /// Fetching an object failed.
    #[error("failed to fetch {key}: {source}")]
    Fetch {
        /// Object key being read.
        key: String,
        /// Transport error, unchanged.
        #[source]
        source: opendal::Error,
    },

    /// Object exists but has no body.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Path is not owned by this adapter.
    #[error("path is not managed by this storage adapter: {path}")]
    NotManaged {
        /// Requested path.
        path: String,
    },
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a read error.
    #[must_use]
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an upload error.
    #[must_use]
    pub fn upload(key: impl Into<String>, source: opendal::Error) -> Self {
        Self::Upload {
            key: key.into(),
            source,
        }
    }

    /// Create a fetch error.
    #[must_use]
    pub fn fetch(key: impl Into<String>, source: opendal::Error) -> Self {
        Self::Fetch {
            key: key.into(),
            source,
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a not managed error.
    #[must_use]
    pub fn not_managed(path: impl Into<String>) -> Self {
        Self::NotManaged { path: path.into() }
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Fetch { source, .. } => source.kind() == opendal::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::Configuration(_) => Self::Internal(err.to_string()),
            StorageError::Read { .. } => Self::Validation(err.to_string()),
            StorageError::NotManaged { .. } => Self::NotManaged(err.to_string()),
            StorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            StorageError::Fetch { .. } if err.is_not_found() => Self::NotFound(err.to_string()),
            StorageError::Fetch { .. } | StorageError::Upload { .. } => {
                Self::ExternalService(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_not_found_maps_to_404() {
        let err = StorageError::fetch(
            "a.jpg",
            opendal::Error::new(opendal::ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_not_found());
        assert_eq!(AppError::from(err).status_code(), 404);
    }

    #[test]
    fn test_upload_failure_maps_to_bad_gateway() {
        let err = StorageError::upload(
            "a.jpg",
            opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert_eq!(AppError::from(err).status_code(), 502);
    }

    #[test]
    fn test_not_managed_maps_to_bad_request() {
        let app: AppError = StorageError::not_managed("https://other.example.com/a.jpg").into();
        assert_eq!(app.error_code(), "NOT_MANAGED");
        assert_eq!(app.status_code(), 400);
    }
}
