//! Anonymous upload subsystem.
//!
//! This module provides the business logic behind the upload endpoints:
//! - Upload-intent validation
//! - Pre-signed write URL issuance (single and batch)
//! - Listing with client-side pagination and read URLs
//! - Single and batch deletion guarded by key-prefix ownership
//!
//! The server never touches file bytes. Clients PUT directly to the storage
//! provider using the issued URLs.

mod error;
pub mod keys;
mod listing;
mod service;
mod types;
mod validation;

pub use error::UploadError;
pub use listing::{FetchAllListing, ListingPage, ListingStrategy};
pub use service::UploadService;
pub use types::{
    BatchDelete, BatchDeleteRequest, BatchIssue, BatchUploadRequest, DeleteOutcome,
    DownloadLink, FileDetails, FilePage, IssueOutcome, IssuedUpload, ListQuery, MAX_BATCH_DELETE,
    MAX_BATCH_UPLOAD, MAX_FILE_SIZE, StoredFile, UploadIntent,
};
pub use validation::{validate_batch_delete, validate_batch_upload, validate_intent};
