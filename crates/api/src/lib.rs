//! HTTP layer with Axum routes.
//!
//! This crate provides:
//! - The serve mount that proxies private-bucket reads
//! - Upload, existence and delete endpoints standing in for the host CMS
//! - Health check
//! - JSON error responses

pub mod error;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use cosgate_core::storage::{ServeHandler, StorageService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Default upload body limit when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage adapter.
    pub storage: Arc<StorageService>,
    /// Reusable serve handler bound to `storage`.
    pub serve: ServeHandler,
    /// Path the serve handler is mounted under.
    pub mount_path: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Directory uploads are spooled to before `save`.
    pub spool_dir: PathBuf,
}

impl AppState {
    /// Create state for a storage service.
    ///
    /// Without an explicit mount path, serve is mounted at `/{path_prefix}`,
    /// which is where private-mode URLs point.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, mount_path: Option<&str>) -> Self {
        let mount_path = mount_path.map_or_else(
            || format!("/{}", storage.config().path_prefix),
            |p| format!("/{}", p.trim_matches('/')),
        );
        Self {
            serve: storage.serve(),
            storage,
            mount_path,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            spool_dir: std::env::temp_dir(),
        }
    }

    /// Override the upload body limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Spool uploads into `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = dir.into();
        self
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::api_routes(state.max_upload_bytes));

    routes::serve::mount(router, &state.mount_path)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
