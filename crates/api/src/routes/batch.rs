//! Batch upload and delete routes.
//!
//! Both endpoints answer 200 once the envelope is valid and report failures
//! per item.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use danmu_core::upload::{
    BatchDelete, BatchDeleteRequest, BatchIssue, BatchUploadRequest, UploadError,
};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, extractors::json_body};

/// Per-item message when a write URL could not be minted.
pub const ISSUE_FAILED: &str = "生成上传URL失败";

/// Per-item message when the provider refused a delete.
pub const DELETE_FAILED: &str = "删除失败";

/// Creates the batch routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload/batch", post(issue_batch).delete(delete_batch))
}

/// POST `/upload/batch`
async fn issue_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchUploadRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let request = json_body(payload)?;

    let batch = service.issue_batch(request).await?;
    Ok(Json(json!({
        "success": true,
        "data": issue_body(&batch),
    })))
}

/// DELETE `/upload/batch`
async fn delete_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let request = json_body(payload)?;

    let batch = service.delete_batch(request).await?;
    Ok(Json(json!({
        "success": true,
        "data": delete_body(&batch),
        "message": batch.message(),
    })))
}

fn issue_body(batch: &BatchIssue) -> Value {
    let uploads: Vec<Value> = batch
        .uploads
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(issued) => json!({
                "originalFileName": outcome.original_file_name,
                "uploadUrl": issued.upload_url,
                "fileUrl": issued.file_url,
                "fileName": issued.storage_key,
                "fileSize": issued.file_size,
                "fileType": issued.file_type,
                "uploadHeaders": issued.upload_headers,
                "expiresAt": issued.expires_at,
            }),
            Err(_) => json!({
                "originalFileName": outcome.original_file_name,
                "error": ISSUE_FAILED,
            }),
        })
        .collect();

    json!({
        "uploads": uploads,
        "expiresIn": batch.expires_in,
        "totalFiles": batch.total(),
        "successCount": batch.success_count(),
        "errorCount": batch.error_count(),
    })
}

fn delete_body(batch: &BatchDelete) -> Value {
    let results: Vec<Value> = batch
        .results
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(()) => json!({ "fileName": outcome.storage_key, "success": true }),
            Err(UploadError::Forbidden { message, .. }) => json!({
                "fileName": outcome.storage_key,
                "success": false,
                "error": message,
            }),
            Err(_) => json!({
                "fileName": outcome.storage_key,
                "success": false,
                "error": DELETE_FAILED,
            }),
        })
        .collect();

    json!({
        "results": results,
        "totalFiles": batch.total(),
        "successCount": batch.success_count(),
        "errorCount": batch.error_count(),
    })
}
