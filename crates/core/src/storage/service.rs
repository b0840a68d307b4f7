//! Object store implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opendal::{Metadata, Operator, services};
use tracing::debug;

use super::config::StorageConfig;
use super::error::StorageError;
use super::object::{ObjectEntry, ObjectMeta, ObjectStore, PresignedUrl, expires_at};

/// S3-compatible object store backed by an OpenDAL operator.
///
/// Built once at process start and shared behind an `Arc`; the operator holds
/// only connection configuration and is safe for concurrent use.
pub struct OpendalStore {
    operator: Operator,
    config: StorageConfig,
}

impl OpendalStore {
    /// Create a new store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(config: &StorageConfig) -> Result<Operator, StorageError> {
        // OpenDAL addresses S3 buckets path-style unless told otherwise.
        let builder = services::S3::default()
            .endpoint(&config.endpoint)
            .bucket(&config.bucket)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.secret_access_key)
            .region(&config.region);

        Ok(Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish())
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn presign_write(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        let presigned = self
            .operator
            .presign_write_with(key, ttl)
            .content_type(content_type)
            .await
            .map_err(StorageError::from)?;

        let mut headers: HashMap<String, String> = presigned
            .header()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        headers
            .entry("Content-Type".to_string())
            .or_insert_with(|| content_type.to_string());

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: expires_at(ttl),
            headers,
        })
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(|e| StorageError::for_key(e, key))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: expires_at(ttl),
            headers: presigned
                .header()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        let entries = self
            .operator
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(StorageError::from)?;

        let objects: Vec<ObjectEntry> = entries
            .into_iter()
            .filter(|entry| !entry.metadata().is_dir())
            .map(|entry| {
                let meta = entry.metadata();
                ObjectEntry {
                    key: entry.path().to_string(),
                    size: meta.content_length(),
                    last_modified: last_modified(meta),
                    etag: meta.etag().map(String::from),
                }
            })
            .collect();

        debug!(prefix = %prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::for_key(e, key))?;

        Ok(ObjectMeta {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
            last_modified: last_modified(&meta),
            etag: meta.etag().map(String::from),
            user_metadata: meta.user_metadata().cloned().unwrap_or_default(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::for_key(e, key))
    }

    fn public_url(&self, key: &str) -> String {
        self.config.public_url(key)
    }
}

fn last_modified(meta: &Metadata) -> Option<DateTime<Utc>> {
    meta.last_modified()
        .map(|ts| DateTime::<Utc>::from(SystemTime::from(ts)))
}
