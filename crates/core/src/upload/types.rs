//! Upload domain types.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use danmu_shared::types::{PageMeta, PageRequest};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::error::UploadError;

/// Maximum size of a single upload: 10MB.
pub const MAX_FILE_SIZE: i64 = 10 * 1024 * 1024;

/// Maximum number of files in one batch upload request.
pub const MAX_BATCH_UPLOAD: usize = 10;

/// Maximum number of keys in one batch delete request.
pub const MAX_BATCH_DELETE: usize = 100;

/// Client-declared metadata of a file it intends to upload.
///
/// Absent fields deserialize to empty values so that validation, not the
/// JSON extractor, reports them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadIntent {
    /// Original file name.
    #[serde(default)]
    #[validate(length(min = 1, message = "文件名不能为空"))]
    pub file_name: String,
    /// Declared MIME type.
    #[serde(default)]
    #[validate(length(min = 1, message = "文件类型不能为空"))]
    pub file_type: String,
    /// Declared size in bytes.
    #[serde(default)]
    #[validate(
        required(message = "文件大小不能为空"),
        custom(function = "validate_file_size")
    )]
    pub file_size: Option<i64>,
}

impl UploadIntent {
    /// Convenience constructor.
    #[must_use]
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>, file_size: i64) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size: Some(file_size),
        }
    }

    /// Declared size in bytes, or 0 when absent or negative.
    #[must_use]
    pub fn declared_size(&self) -> u64 {
        self.file_size
            .and_then(|size| u64::try_from(size).ok())
            .unwrap_or_default()
    }
}

fn validate_file_size(size: i64) -> Result<(), ValidationError> {
    let message = if size < 1 {
        "文件大小必须大于0"
    } else if size > MAX_FILE_SIZE {
        "文件大小不能超过10MB"
    } else {
        return Ok(());
    };
    Err(ValidationError::new("range").with_message(Cow::Borrowed(message)))
}

/// Batch upload request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchUploadRequest {
    /// Files to upload, `1..=10`.
    pub files: Vec<UploadIntent>,
}

/// A write capability issued for one file.
#[derive(Debug, Clone)]
pub struct IssuedUpload {
    /// Name the client declared.
    pub original_file_name: String,
    /// Pre-signed PUT URL.
    pub upload_url: String,
    /// Stable URL of the object once uploaded.
    pub file_url: String,
    /// Storage key.
    pub storage_key: String,
    /// Declared size in bytes.
    pub file_size: u64,
    /// Declared MIME type.
    pub file_type: String,
    /// Headers the client must send with the PUT.
    pub upload_headers: HashMap<String, String>,
    /// When the upload URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// Outcome of one item in a batch issue.
#[derive(Debug)]
pub struct IssueOutcome {
    /// Name the client declared.
    pub original_file_name: String,
    /// The issued upload, or why it could not be issued.
    pub result: Result<IssuedUpload, UploadError>,
}

/// Result of a batch issue, in input order.
#[derive(Debug)]
pub struct BatchIssue {
    /// Per-item outcomes.
    pub uploads: Vec<IssueOutcome>,
    /// Write URL lifetime in seconds.
    pub expires_in: u64,
}

impl BatchIssue {
    /// Number of items in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.uploads.len()
    }

    /// Number of items that received an upload URL.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.uploads.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of items that failed.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.total() - self.success_count()
    }
}

/// A read capability for one object.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    /// Pre-signed GET URL.
    pub download_url: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Query for the file listing.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Sub-prefix under the anonymous namespace.
    pub prefix: Option<String>,
    /// Page to return.
    pub page: PageRequest,
}

/// A stored object as shown in the file table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Storage key.
    #[serde(rename = "fileName")]
    pub storage_key: String,
    /// Key without the anonymous prefix.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag without quotes.
    pub etag: String,
    /// Public URL.
    pub url: String,
    /// One-hour read URL, absent when minting it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
}

/// One page of the file listing.
#[derive(Debug, Clone, Serialize)]
pub struct FilePage {
    /// Files on this page, newest first.
    pub files: Vec<StoredFile>,
    /// Pagination metadata.
    pub pagination: PageMeta,
}

/// Full metadata of one stored object.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    /// Storage key.
    #[serde(rename = "fileName")]
    pub storage_key: String,
    /// Key without the anonymous prefix.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Recorded content type.
    pub content_type: String,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag without quotes.
    pub etag: String,
    /// One-hour read URL.
    pub download_url: String,
    /// User-defined object metadata.
    pub metadata: HashMap<String, String>,
}

/// Batch delete request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    /// Keys to delete, `1..=100`.
    #[serde(default)]
    pub file_names: Vec<String>,
}

/// Outcome of deleting one key in a batch.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// Storage key.
    pub storage_key: String,
    /// Success, or why the key was not deleted.
    pub result: Result<(), UploadError>,
}

/// Result of a batch delete, in input order.
#[derive(Debug)]
pub struct BatchDelete {
    /// Per-key outcomes.
    pub results: Vec<DeleteOutcome>,
}

impl BatchDelete {
    /// Number of keys in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of keys deleted.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of keys that could not be deleted.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.total() - self.success_count()
    }

    /// Summary message embedding both counts.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "成功删除 {} 个文件，{} 个文件删除失败",
            self.success_count(),
            self.error_count()
        )
    }
}

/// Strip the quotes S3 puts around ETags.
pub(crate) fn unquote_etag(etag: Option<&str>) -> String {
    etag.map(|e| e.replace('"', "")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_intent_deserializes_camel_case() {
        let intent: UploadIntent =
            serde_json::from_str(r#"{"fileName":"a.png","fileType":"image/png","fileSize":1000}"#)
                .expect("valid json");
        assert_eq!(intent, UploadIntent::new("a.png", "image/png", 1000));
    }

    #[test]
    fn test_intent_missing_fields_default() {
        let intent: UploadIntent =
            serde_json::from_str(r#"{"fileName":"a.png"}"#).expect("partial json");
        assert_eq!(intent.file_name, "a.png");
        assert!(intent.file_type.is_empty());
        assert_eq!(intent.file_size, None);
        assert_eq!(intent.declared_size(), 0);
    }

    #[test]
    fn test_batch_delete_counts_and_message() {
        let batch = BatchDelete {
            results: vec![
                DeleteOutcome {
                    storage_key: "uploads/a".into(),
                    result: Ok(()),
                },
                DeleteOutcome {
                    storage_key: "etc/b".into(),
                    result: Err(UploadError::delete_denied("etc/b", "uploads/")),
                },
                DeleteOutcome {
                    storage_key: "uploads/c".into(),
                    result: Err(UploadError::Provider(StorageError::operation("x"))),
                },
            ],
        };
        assert_eq!(batch.success_count(), 1);
        assert_eq!(batch.error_count(), 2);
        assert_eq!(batch.message(), "成功删除 1 个文件，2 个文件删除失败");
    }

    #[test]
    fn test_unquote_etag() {
        assert_eq!(unquote_etag(Some("\"abc123\"")), "abc123");
        assert_eq!(unquote_etag(None), "");
    }

    #[test]
    fn test_stored_file_serialization() {
        let file = StoredFile {
            storage_key: "uploads/anonymous/1-a.png".into(),
            display_name: "1-a.png".into(),
            size: 10,
            last_modified: None,
            etag: "e".into(),
            url: "https://x/uploads/anonymous/1-a.png".into(),
            signed_url: None,
        };
        let json = serde_json::to_value(&file).expect("serialize");
        assert_eq!(json["fileName"], "uploads/anonymous/1-a.png");
        assert_eq!(json["displayName"], "1-a.png");
        assert!(json.get("signedUrl").is_none());
    }
}
