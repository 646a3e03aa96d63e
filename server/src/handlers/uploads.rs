//! Batch mutation endpoints: upload and deletion.

use super::Acknowledgement;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use geo_index::ImageId;
use serde::Deserialize;
use std::sync::Arc;

/// Multipart field clients put their files in.
pub const UPLOAD_FIELD: &str = "image";

/// POST /api/image-upload
///
/// Persists every file part under a fresh identifier, then runs the batch
/// through ingestion. Per-file problems never fail the request. A multipart
/// stream that breaks off still has its completed parts ingested; only an
/// oversized body is reported back, as 413.
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Acknowledgement>> {
    let multipart = multipart?;
    let (uploaded, stream_error) = persist_parts(&state, multipart).await;

    let library = Arc::clone(&state.library);
    let report = tokio::task::spawn_blocking(move || library.ingest_batch(&uploaded)).await?;

    tracing::info!(
        files = report.len(),
        indexed = report.indexed(),
        without_position = report.without_position(),
        thumbnail_failures = report.thumbnail_failures(),
        failures = report.failures(),
        withdrawn = report.withdrawn(),
        "Upload batch ingested"
    );

    match stream_error {
        Some(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(ApiError::from(e)),
        _ => Ok(Json(Acknowledgement::ok("Uploaded successfully!"))),
    }
}

/// Persist file parts until the stream ends or fails. Returns the stored ids
/// together with the error that cut the stream short, if any.
async fn persist_parts(
    state: &AppState,
    mut multipart: Multipart,
) -> (Vec<ImageId>, Option<MultipartError>) {
    let mut uploaded = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return (uploaded, None),
            Err(e) => {
                tracing::warn!(persisted = uploaded.len(), error = %e.body_text(), "Multipart stream failed");
                return (uploaded, Some(e));
            }
        };

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!(field = ?field.name(), file_name = %file_name, "File part outside the image field");
        }
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    file_name = %file_name,
                    persisted = uploaded.len(),
                    error = %e.body_text(),
                    "Incomplete file part, dropping it"
                );
                return (uploaded, Some(e));
            }
        };

        let library = Arc::clone(&state.library);
        let name = file_name.clone();
        match tokio::task::spawn_blocking(move || library.store().persist_upload(&name, &data)).await
        {
            Ok(Ok(id)) => {
                tracing::debug!(image = %id, file_name = %file_name, "Upload persisted");
                uploaded.push(id);
            }
            Ok(Err(e)) => {
                tracing::error!(file_name = %file_name, error = %e, "Failed to persist upload");
            }
            Err(e) => {
                tracing::error!(file_name = %file_name, error = %e, "Upload persistence task failed");
            }
        }
    }
}

/// Deletion request body. Each entry is a full identifier including its
/// extension, exactly as listed by `GET /api/get-images`.
#[derive(Debug, Deserialize)]
pub struct DeletionRequest {
    #[serde(rename = "forDeletion", default)]
    pub for_deletion: Vec<String>,
}

/// POST /api/image-deletion
pub async fn delete_images(
    State(state): State<AppState>,
    request: Result<Json<DeletionRequest>, JsonRejection>,
) -> ApiResult<Json<Acknowledgement>> {
    let Json(request) = request?;
    let requested = request.for_deletion.len();
    let library = Arc::clone(&state.library);
    let report =
        tokio::task::spawn_blocking(move || library.delete_batch(&request.for_deletion)).await?;

    tracing::info!(
        requested,
        deleted = report.deleted.len(),
        rejected = report.rejected.len(),
        errors = report.errors(),
        "Deletion batch processed"
    );

    Ok(Json(Acknowledgement::ok("Request received!")))
}
