//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Map an OpenDAL error raised while operating on `key`.
    #[must_use]
    pub fn for_key(err: opendal::Error, key: &str) -> Self {
        if err.kind() == opendal::ErrorKind::NotFound {
            Self::not_found(key)
        } else {
            Self::from(err)
        }
    }
}

/// Errors without a key in scope. A missing object here is reported as an
/// operation failure; use [`StorageError::for_key`] when the key is known.
impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_key_not_found_carries_key() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "missing");
        let mapped = StorageError::for_key(err, "uploads/anonymous/a.png");
        assert!(matches!(
            &mapped,
            StorageError::NotFound { key } if key == "uploads/anonymous/a.png"
        ));
    }

    #[test]
    fn test_for_key_other_kinds_fall_through() {
        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            StorageError::for_key(err, "uploads/anonymous/a.png"),
            StorageError::Operation(_)
        ));
    }

    #[test]
    fn test_from_opendal_not_found_without_key() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "missing");
        assert!(matches!(StorageError::from(err), StorageError::Operation(_)));
    }

    #[test]
    fn test_from_opendal_unsupported() {
        let err = opendal::Error::new(opendal::ErrorKind::Unsupported, "no presign");
        assert!(matches!(
            StorageError::from(err),
            StorageError::PresignNotSupported
        ));
    }

    #[test]
    fn test_from_opendal_other() {
        let err = opendal::Error::new(opendal::ErrorKind::Unexpected, "boom");
        assert!(matches!(StorageError::from(err), StorageError::Operation(_)));
    }
}
