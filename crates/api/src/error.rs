//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use danmu_core::upload::UploadError;
use danmu_shared::AppError;
use serde_json::json;
use tracing::{debug, error};

/// Error returned by handlers, rendered as `{success: false, message, errors?}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Bad request with a message and no field detail.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(AppError::validation(message))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        } else {
            debug!(code = self.0.error_code(), error = %self.0, "Request rejected");
        }

        let mut body = json!({
            "success": false,
            "message": self.0.public_message(),
        });
        let errors = self.0.field_errors();
        if !errors.is_empty() {
            body["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}
