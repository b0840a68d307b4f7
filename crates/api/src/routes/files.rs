//! File table routes.

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::get,
};
use danmu_core::upload::ListQuery;
use danmu_shared::types::PageRequest;
use serde::Deserialize;
use serde_json::Value;

use super::{success, upload::FileNameParam};
use crate::{
    AppState,
    error::ApiError,
    extractors::{json_body, lenient_u32, query_params},
};

/// Creates the file table routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload/files", get(list_files).post(file_details))
}

/// Raw listing query. Numbers arrive as strings and are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesQuery {
    /// 1-based page number.
    pub page: Option<String>,
    /// Page size, clamped to `[1, 100]`.
    pub limit: Option<String>,
    /// Sub-prefix under the anonymous namespace.
    pub prefix: Option<String>,
}

impl From<ListFilesQuery> for ListQuery {
    fn from(query: ListFilesQuery) -> Self {
        Self {
            page: PageRequest::from_query(
                lenient_u32(query.page.as_deref()),
                lenient_u32(query.limit.as_deref()),
            ),
            prefix: query.prefix.filter(|p| !p.is_empty()),
        }
    }
}

/// GET `/upload/files?page&limit&prefix`
async fn list_files(
    State(state): State<AppState>,
    query: Result<Query<ListFilesQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let query = query_params(query)?;

    let page = service.list(query.into()).await?;
    Ok(success(page))
}

/// POST `/upload/files`
async fn file_details(
    State(state): State<AppState>,
    payload: Result<Json<FileNameParam>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let service = state.upload_service()?;
    let key = json_body(payload)?.require()?;

    let details = service.file_details(&key).await?;
    Ok(success(details))
}
