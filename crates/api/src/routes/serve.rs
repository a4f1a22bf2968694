//! Serve mount for objects in private storage.
//!
//! Private-mode saves return host-relative URLs under the path prefix; this
//! mount turns those requests back into object fetches, including the
//! case-insensitive fallback.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
};
use cosgate_shared::AppError;
use tracing::warn;

use crate::{ApiError, AppState};

/// Attach the serve routes to `router` under `mount_path`.
pub fn mount(router: Router<AppState>, mount_path: &str) -> Router<AppState> {
    let serve = Router::new().route("/{*path}", get(serve_object));
    if mount_path.trim_matches('/').is_empty() {
        router.merge(serve)
    } else {
        router.nest(mount_path, serve)
    }
}

/// GET `{mount}/{*path}`
/// Stream an object with its stored headers, or 404.
async fn serve_object(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let request_path = format!("/{path}");
    match state.serve.handle(&request_path).await {
        Ok(object) => {
            let mut response = Body::from(object.body).into_response();
            let headers = response.headers_mut();
            for (name, value) in &object.headers {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => warn!(header = %name, key = %object.key, "Skipping invalid header"),
                }
            }
            response
        }
        Err(err) => {
            warn!(path = %request_path, error = %err, "Serve failed");
            ApiError(AppError::NotFound(err.to_string())).into_response()
        }
    }
}
