//! Upload service implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::error::UploadError;
use super::keys::{self, ANONYMOUS_PREFIX, UPLOAD_ROOT};
use super::listing::{FetchAllListing, ListingStrategy};
use super::types::{
    BatchDelete, BatchDeleteRequest, BatchIssue, BatchUploadRequest, DeleteOutcome, DownloadLink,
    FileDetails, FilePage, IssueOutcome, IssuedUpload, ListQuery, StoredFile, UploadIntent,
    unquote_etag,
};
use super::validation::{validate_batch_delete, validate_batch_upload, validate_intent};
use crate::storage::{ObjectStore, OpendalStore, StorageConfig};
use danmu_shared::types::PageMeta;

/// Issues upload capabilities and manages stored uploads.
///
/// Holds no per-request state. One instance is built at start-up and shared
/// across handlers.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    listing: Arc<dyn ListingStrategy>,
    upload_ttl: Duration,
    download_ttl: Duration,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("upload_ttl", &self.upload_ttl)
            .field("download_ttl", &self.download_ttl)
            .finish_non_exhaustive()
    }
}

impl UploadService {
    /// Create a service over `store` with the default TTLs and listing.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            listing: Arc::new(FetchAllListing),
            upload_ttl: Duration::from_secs(StorageConfig::DEFAULT_UPLOAD_TTL),
            download_ttl: Duration::from_secs(StorageConfig::DEFAULT_DOWNLOAD_TTL),
        }
    }

    /// Build a service backed by an S3-compatible store.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the operator cannot be built.
    pub fn from_config(config: StorageConfig) -> Result<Self, UploadError> {
        let upload_ttl = Duration::from_secs(config.presign_upload_ttl_secs);
        let download_ttl = Duration::from_secs(config.presign_download_ttl_secs);
        let store = OpendalStore::from_config(config)?;
        Ok(Self::new(Arc::new(store))
            .with_upload_ttl(upload_ttl)
            .with_download_ttl(download_ttl))
    }

    /// Replace the listing strategy.
    #[must_use]
    pub fn with_listing_strategy(mut self, listing: Arc<dyn ListingStrategy>) -> Self {
        self.listing = listing;
        self
    }

    /// Set the write capability lifetime.
    #[must_use]
    pub fn with_upload_ttl(mut self, ttl: Duration) -> Self {
        self.upload_ttl = ttl;
        self
    }

    /// Set the read capability lifetime.
    #[must_use]
    pub fn with_download_ttl(mut self, ttl: Duration) -> Self {
        self.download_ttl = ttl;
        self
    }

    /// Write capability lifetime in seconds.
    #[must_use]
    pub fn upload_ttl_secs(&self) -> u64 {
        self.upload_ttl.as_secs()
    }

    /// Read capability lifetime in seconds.
    #[must_use]
    pub fn download_ttl_secs(&self) -> u64 {
        self.download_ttl.as_secs()
    }

    /// Issue a write URL for one anonymous upload.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad intent, or a provider error if the
    /// URL could not be minted.
    pub async fn issue_single(&self, intent: UploadIntent) -> Result<IssuedUpload, UploadError> {
        validate_intent(&intent)?;

        let key = keys::single_key(
            Utc::now().timestamp_millis(),
            &keys::random_suffix(),
            &intent.file_name,
        );
        let issued = self.presign(key, &intent).await.inspect_err(|e| {
            error!(file_name = %intent.file_name, error = %e, "Failed to generate upload URL");
        })?;

        info!(key = %issued.storage_key, size = intent.declared_size(), "Issued upload URL");
        Ok(issued)
    }

    /// Issue write URLs for up to ten files.
    ///
    /// All items share one timestamp and are distinguished by index. A provider
    /// failure is recorded on its item and never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the envelope or any item is invalid. No
    /// URL is minted in that case.
    pub async fn issue_batch(&self, request: BatchUploadRequest) -> Result<BatchIssue, UploadError> {
        validate_batch_upload(&request)?;

        let timestamp = Utc::now().timestamp_millis();
        let pending = request.files.iter().enumerate().map(|(index, intent)| {
            let key = keys::batch_key(timestamp, index, &keys::random_suffix(), &intent.file_name);
            async move {
                let result = self.presign(key, intent).await;
                if let Err(e) = &result {
                    warn!(index, file_name = %intent.file_name, error = %e, "Batch item presign failed");
                }
                IssueOutcome {
                    original_file_name: intent.file_name.clone(),
                    result,
                }
            }
        });
        let uploads = join_all(pending).await;

        let batch = BatchIssue {
            uploads,
            expires_in: self.upload_ttl_secs(),
        };
        info!(
            total = batch.total(),
            success = batch.success_count(),
            failed = batch.error_count(),
            "Issued batch upload URLs"
        );
        Ok(batch)
    }

    /// Mint a read URL for an anonymous upload.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error for keys outside the anonymous namespace, or
    /// a provider error.
    pub async fn download_url(&self, key: &str) -> Result<DownloadLink, UploadError> {
        if !keys::is_owned(key, ANONYMOUS_PREFIX) {
            warn!(key = %key, "Rejected download outside anonymous prefix");
            return Err(UploadError::access_denied(key, ANONYMOUS_PREFIX));
        }

        let presigned = self.store.presign_read(key, self.download_ttl).await?;
        debug!(key = %key, "Issued download URL");
        Ok(DownloadLink {
            download_url: presigned.url,
            expires_in: self.download_ttl_secs(),
        })
    }

    /// Full metadata of an anonymous upload plus a read URL.
    ///
    /// # Errors
    ///
    /// Returns forbidden for keys outside the anonymous namespace, not found
    /// when the object is missing, or a provider error.
    pub async fn file_details(&self, key: &str) -> Result<FileDetails, UploadError> {
        if !keys::is_owned(key, ANONYMOUS_PREFIX) {
            warn!(key = %key, "Rejected details outside anonymous prefix");
            return Err(UploadError::access_denied(key, ANONYMOUS_PREFIX));
        }

        let meta = self.store.stat(key).await?;
        let presigned = self.store.presign_read(key, self.download_ttl).await?;

        Ok(FileDetails {
            display_name: keys::display_name(key).to_string(),
            size: meta.size,
            content_type: meta
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            last_modified: meta.last_modified,
            etag: unquote_etag(meta.etag.as_deref()),
            download_url: presigned.url,
            metadata: meta.user_metadata,
            storage_key: meta.key,
        })
    }

    /// One page of anonymous uploads, newest first, each with a read URL.
    ///
    /// A read URL that fails to mint is left out of its item; the page is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns a provider error if the listing itself fails.
    pub async fn list(&self, query: ListQuery) -> Result<FilePage, UploadError> {
        let request = query.page.normalized();
        let prefix = match query.prefix.as_deref() {
            Some(sub) if !sub.is_empty() => format!("{ANONYMOUS_PREFIX}{sub}"),
            _ => ANONYMOUS_PREFIX.to_string(),
        };

        let page = self
            .listing
            .page(self.store.as_ref(), &prefix, request)
            .await
            .inspect_err(|e| error!(prefix = %prefix, error = %e, "Failed to list uploads"))?;

        let signed = join_all(page.items.iter().map(|entry| async move {
            match self.store.presign_read(&entry.key, self.download_ttl).await {
                Ok(presigned) => Some(presigned.url),
                Err(e) => {
                    warn!(key = %entry.key, error = %e, "Failed to sign listing URL");
                    None
                }
            }
        }))
        .await;

        let files = page
            .items
            .into_iter()
            .zip(signed)
            .map(|(entry, signed_url)| StoredFile {
                display_name: keys::display_name(&entry.key).to_string(),
                size: entry.size,
                last_modified: entry.last_modified,
                etag: unquote_etag(entry.etag.as_deref()),
                url: self.store.public_url(&entry.key),
                signed_url,
                storage_key: entry.key,
            })
            .collect();

        Ok(FilePage {
            files,
            pagination: PageMeta::new(request, page.total),
        })
    }

    /// Delete one anonymous upload.
    ///
    /// # Errors
    ///
    /// Returns forbidden for keys outside the anonymous namespace without
    /// calling the provider, or a provider error.
    pub async fn delete_one(&self, key: &str) -> Result<(), UploadError> {
        if !keys::is_owned(key, ANONYMOUS_PREFIX) {
            warn!(key = %key, "Rejected delete outside anonymous prefix");
            return Err(UploadError::delete_denied(key, ANONYMOUS_PREFIX));
        }

        self.store
            .delete(key)
            .await
            .inspect_err(|e| error!(key = %key, error = %e, "Failed to delete upload"))?;
        info!(key = %key, "Deleted upload");
        Ok(())
    }

    /// Delete up to a hundred uploads.
    ///
    /// Each key is authorised against the upload root on its own; failures are
    /// recorded per key in input order.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the key list is empty or too long.
    pub async fn delete_batch(&self, request: BatchDeleteRequest) -> Result<BatchDelete, UploadError> {
        validate_batch_delete(&request)?;

        let pending = request.file_names.into_iter().map(|key| async move {
            let result = if keys::is_owned(&key, UPLOAD_ROOT) {
                self.store.delete(&key).await.map_err(UploadError::from)
            } else {
                Err(UploadError::delete_denied(key.clone(), UPLOAD_ROOT))
            };
            if let Err(e) = &result {
                warn!(key = %key, error = %e, "Batch delete item failed");
            }
            DeleteOutcome {
                storage_key: key,
                result,
            }
        });
        let batch = BatchDelete {
            results: join_all(pending).await,
        };

        info!(
            total = batch.total(),
            success = batch.success_count(),
            failed = batch.error_count(),
            "Batch delete finished"
        );
        Ok(batch)
    }

    async fn presign(&self, key: String, intent: &UploadIntent) -> Result<IssuedUpload, UploadError> {
        let presigned = self
            .store
            .presign_write(&key, &intent.file_type, self.upload_ttl)
            .await?;

        Ok(IssuedUpload {
            original_file_name: intent.file_name.clone(),
            upload_url: presigned.url,
            file_url: self.store.public_url(&key),
            storage_key: key,
            file_size: intent.declared_size(),
            file_type: intent.file_type.clone(),
            upload_headers: presigned.headers,
            expires_at: presigned.expires_at,
        })
    }
}
