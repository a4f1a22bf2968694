//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod files;
pub mod health;
pub mod serve;

/// Creates the `/api/v1` router.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().merge(files::routes(max_upload_bytes))
}
