//! Object storage for anonymous uploads using Apache OpenDAL.
//!
//! The upload service only talks to the [`ObjectStore`] trait. Production uses
//! [`OpendalStore`] against an S3-compatible endpoint (Bitiful S4, Cloudflare R2,
//! AWS S3); tests use the in-memory store behind the `test-util` feature.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.list_with(prefix)       │ op.presign_read("key", duration)   │
//! │ op.stat("key")             │ op.presign_write_with("key", ttl)  │
//! │ op.delete("key")           │                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
#[cfg(any(test, feature = "test-util"))]
mod memory;
mod object;
mod service;

pub use config::StorageConfig;
pub use error::StorageError;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryStore, StoreCalls};
pub use object::{ObjectEntry, ObjectMeta, ObjectStore, PresignedUrl};
pub use service::OpendalStore;
