//! Upload business logic for the Danmu back office.
//!
//! This crate contains the upload subsystem with ZERO web dependencies.
//!
//! # Modules
//!
//! - `storage` - Object-storage adapter (OpenDAL) and the `ObjectStore` seam
//! - `upload` - Intent validation, pre-signed URL issuance, listing and deletion

pub mod storage;
pub mod upload;
