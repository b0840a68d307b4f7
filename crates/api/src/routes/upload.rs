//! Single-file upload routes.
//!
//! - `POST /upload` issues a write URL for one file
//! - `GET /upload?fileName=` issues a read URL
//! - `DELETE /upload` removes one file

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::post,
};
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use danmu_core::upload::UploadIntent;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::success;
use crate::{
    AppState,
    error::ApiError,
    extractors::{json_body, query_params},
};

/// Message when the file name is absent or empty.
pub const MISSING_FILE_NAME: &str = "文件名参数缺失";

/// Creates the single-file upload routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(issue_upload).get(download_url).delete(delete_upload),
    )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query or body naming one stored file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNameParam {
    /// Storage key.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl FileNameParam {
    /// The key, or a 400 when it is absent or empty.
    pub fn require(self) -> Result<String, ApiError> {
        self.file_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::bad_request(MISSING_FILE_NAME))
    }
}

/// Response for an issued upload URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// Pre-signed PUT URL.
    pub upload_url: String,
    /// Public URL of the object once uploaded.
    pub file_url: String,
    /// Storage key.
    pub file_name: String,
    /// Lifetime of the upload URL in seconds.
    pub expires_in: u64,
    /// When the upload URL stops working.
    pub expires_at: DateTime<Utc>,
    /// Headers the PUT must carry for the signature to match.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub upload_headers: HashMap<String, String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/upload`
async fn issue_upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadIntent>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let intent = json_body(payload)?;

    let issued = service.issue_single(intent).await?;

    Ok(success(UploadUrlResponse {
        upload_url: issued.upload_url,
        file_url: issued.file_url,
        file_name: issued.storage_key,
        expires_in: service.upload_ttl_secs(),
        expires_at: issued.expires_at,
        upload_headers: issued.upload_headers,
    }))
}

/// GET `/upload?fileName=`
async fn download_url(
    State(state): State<AppState>,
    query: Result<Query<FileNameParam>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let key = query_params(query)?.require()?;

    let link = service.download_url(&key).await?;
    Ok(success(link))
}

/// DELETE `/upload`
async fn delete_upload(
    State(state): State<AppState>,
    payload: Result<Json<FileNameParam>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let key = json_body(payload)?.require()?;

    service.delete_one(&key).await?;
    Ok(Json(json!({
        "success": true,
        "message": "文件删除成功",
    })))
}
