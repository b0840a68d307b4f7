//! API route definitions.

use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};

use crate::AppState;

pub mod batch;
pub mod files;
pub mod health;
pub mod upload;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(upload::routes())
        .merge(batch::routes())
        .merge(files::routes())
}

/// Wraps `data` in the success envelope.
pub(crate) fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}
