//! Request extraction helpers.
//!
//! Handlers take bodies as `Result<Json<T>, JsonRejection>` so the storage
//! configuration check runs before the body is judged. These helpers turn
//! rejections into the standard 400 response.

use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use tracing::debug;

use crate::error::ApiError;

/// Message for malformed bodies and queries.
pub const INVALID_REQUEST: &str = "请求参数错误";

/// Unwraps a JSON body or maps the rejection to a 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!(error = %rejection, "Rejected request body");
        ApiError::bad_request(INVALID_REQUEST)
    })
}

/// Unwraps query parameters or maps the rejection to a 400.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        debug!(error = %rejection, "Rejected query string");
        ApiError::bad_request(INVALID_REQUEST)
    })
}

/// Parses an optional numeric query value. Anything unparsable counts as absent.
#[must_use]
pub fn lenient_u32(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse().ok())
}
