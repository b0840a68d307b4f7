//! Upload error types.

use danmu_shared::{AppError, FieldError};
use thiserror::Error;

use crate::storage::StorageError;

/// Upload operation errors.
///
/// `Validation` and `Configuration` always abort the whole request.
/// `Forbidden` and `Provider` abort single-item operations but are recorded
/// per item inside batches.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Malformed or out-of-range input.
    #[error("validation failed: {message}")]
    Validation {
        /// Summary message shown to the client.
        message: String,
        /// Every violated constraint.
        errors: Vec<FieldError>,
    },

    /// Storage bucket or credentials are not configured.
    #[error("storage is not configured: {0}")]
    Configuration(String),

    /// Key is outside the namespace the operation may touch.
    #[error("key '{key}' is outside the allowed prefix '{prefix}'")]
    Forbidden {
        /// Offending storage key.
        key: String,
        /// Prefix the key had to start with.
        prefix: &'static str,
        /// User-facing message.
        message: &'static str,
    },

    /// Object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The storage provider call failed.
    #[error("storage provider error: {0}")]
    Provider(#[source] StorageError),
}

impl UploadError {
    /// Create a validation error with a single field violation.
    #[must_use]
    pub fn invalid_field(
        message: impl Into<String>,
        field: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self::Validation {
            errors: vec![FieldError::new(field, code, message.clone())],
            message,
        }
    }

    /// Key may not be read through this operation.
    #[must_use]
    pub fn access_denied(key: impl Into<String>, prefix: &'static str) -> Self {
        Self::Forbidden {
            key: key.into(),
            prefix,
            message: "无权限访问此文件",
        }
    }

    /// Key may not be deleted through this operation.
    #[must_use]
    pub fn delete_denied(key: impl Into<String>, prefix: &'static str) -> Self {
        Self::Forbidden {
            key: key.into(),
            prefix,
            message: "无权限删除此文件",
        }
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound(key),
            StorageError::Configuration(msg) => Self::Configuration(msg),
            other => Self::Provider(other),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation { message, errors } => Self::Validation { message, errors },
            UploadError::Configuration(msg) => Self::Configuration(msg),
            UploadError::Forbidden { message, .. } => Self::Forbidden(message.to_string()),
            UploadError::NotFound(_) => Self::NotFound("文件不存在".to_string()),
            UploadError::Provider(e) => Self::ExternalService(e.to_string()),
        }
    }
}
