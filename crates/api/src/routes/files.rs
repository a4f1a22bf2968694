//! File management routes.
//!
//! These endpoints play the host CMS role: they spool uploads to a temporary
//! file and drive the adapter's save, exists and delete operations.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
    routing::{delete, get, post},
};
use cosgate_core::storage::StoredFile;
use cosgate_shared::AppError;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{ApiError, AppState};

/// File name prefix for spooled uploads.
pub const SPOOL_PREFIX: &str = "cosgate-upload-";

/// Creates the file routes.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/uploads",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/files/exists", get(exists))
        .route("/files", delete(remove))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// URL the file is reachable at.
    pub url: String,
}

/// Query identifying a stored file.
#[derive(Debug, Deserialize)]
pub struct FileQuery {
    /// File name inside the target directory.
    pub file_name: String,
    /// Target directory relative to the path prefix.
    #[serde(default)]
    pub target_dir: Option<String>,
}

/// Response for an existence check.
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    /// Whether the file exists.
    pub exists: bool,
}

/// Response for a delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Whether the file was deleted.
    pub deleted: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/uploads`
/// Multipart upload with a `file` field and an optional `target_dir` field.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut target_dir: Option<String> = None;
    let mut spooled: Option<Spooled> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "target_dir" => {
                let dir = field.text().await.map_err(multipart_error)?;
                target_dir = Some(dir).filter(|d| !d.trim().is_empty());
            }
            "file" => {
                if spooled.is_some() {
                    return Err(AppError::Validation("duplicate `file` field".into()).into());
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                let temp = tempfile::Builder::new()
                    .prefix(SPOOL_PREFIX)
                    .tempfile_in(&state.spool_dir)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                tokio::fs::write(temp.path(), &data)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                let file = StoredFile::new(temp.path(), file_name, content_type);
                spooled = Some(Spooled { temp, file });
            }
            _ => {}
        }
    }

    let Spooled { temp, file } =
        spooled.ok_or_else(|| AppError::Validation("missing `file` field".into()))?;
    let result = state.storage.save(&file, target_dir.as_deref()).await;

    if let Err(e) = temp.close() {
        warn!(path = %file.path.display(), error = %e, "Failed to remove spooled upload");
    }

    let url = result?;
    info!(url = %url, name = %file.name, "File uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

/// GET `/files/exists?file_name=&target_dir=`
async fn exists(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Json<ExistsResponse> {
    let exists = state
        .storage
        .exists(&query.file_name, query.target_dir.as_deref().unwrap_or_default())
        .await;
    Json(ExistsResponse { exists })
}

/// DELETE `/files?file_name=&target_dir=`
async fn remove(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Json<DeleteResponse> {
    let deleted = state
        .storage
        .delete(&query.file_name, query.target_dir.as_deref())
        .await;
    Json(DeleteResponse { deleted })
}

/// An upload held on disk until `save` has read it.
///
/// Dropping it removes the file, so early returns leave nothing behind.
struct Spooled {
    temp: NamedTempFile,
    file: StoredFile,
}

/// Map a multipart failure, keeping the body-limit status.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}
