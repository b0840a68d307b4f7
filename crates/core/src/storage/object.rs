//! The object-store seam and the values that cross it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageError;

/// Presigned URL for upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// One object returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the provider reported one.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag as reported by the provider (may be quoted).
    pub etag: Option<String>,
}

/// Full metadata of a single object.
#[derive(Debug, Clone, Default)]
pub struct ObjectMeta {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded at upload time.
    pub content_type: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag as reported by the provider.
    pub etag: Option<String>,
    /// User-defined metadata.
    pub user_metadata: HashMap<String, String>,
}

/// Object storage operations used by the upload service.
///
/// Implementations are long-lived and shared across requests, so they must be
/// safe for concurrent use.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Mint a write capability for `key`, bound to `content_type`.
    async fn presign_write(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError>;

    /// Mint a read capability for `key`.
    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;

    /// List every object whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError>;

    /// Fetch metadata of a single object.
    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Stable public URL of an object.
    fn public_url(&self, key: &str) -> String;
}

/// Expiry instant for a capability minted now with `ttl`.
pub(crate) fn expires_at(ttl: Duration) -> DateTime<Utc> {
    let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    chrono::TimeDelta::try_seconds(secs)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
