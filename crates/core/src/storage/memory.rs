//! In-memory object store for tests.
//!
//! Records every provider call so tests can assert that rejected requests
//! never reached storage, and can inject per-key failures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageError;
use super::object::{ObjectEntry, ObjectMeta, ObjectStore, PresignedUrl, expires_at};

/// Snapshot of provider call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    /// `presign_write` calls.
    pub presign_write: usize,
    /// `presign_read` calls.
    pub presign_read: usize,
    /// `list` calls.
    pub list: usize,
    /// `stat` calls.
    pub stat: usize,
    /// `delete` calls.
    pub delete: usize,
}

impl StoreCalls {
    /// Total number of provider calls.
    #[must_use]
    pub fn total(&self) -> usize {
        self.presign_write + self.presign_read + self.list + self.stat + self.delete
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    size: u64,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Failures {
    presign_write_content_types: HashSet<String>,
    presign_read_keys: HashSet<String>,
    delete_keys: HashSet<String>,
}

/// Object store that keeps objects in a sorted map.
#[derive(Debug)]
pub struct MemoryStore {
    base_url: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failures: Mutex<Failures>,
    presign_write_calls: AtomicUsize,
    presign_read_calls: AtomicUsize,
    list_calls: AtomicUsize,
    stat_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: "https://danmu-test.s3.bitiful.net".to_string(),
            objects: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(Failures::default()),
            presign_write_calls: AtomicUsize::new(0),
            presign_read_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            stat_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Simulate a client PUT to a presigned URL.
    pub fn put(&self, key: impl Into<String>, size: u64, content_type: impl Into<String>) {
        self.put_at(key, size, content_type, Utc::now());
    }

    /// Store an object with an explicit modification time.
    pub fn put_at(
        &self,
        key: impl Into<String>,
        size: u64,
        content_type: impl Into<String>,
        last_modified: DateTime<Utc>,
    ) {
        let object = StoredObject {
            size,
            content_type: content_type.into(),
            last_modified,
        };
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), object);
    }

    /// Whether an object exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make `presign_write` fail for uploads declaring `content_type`.
    pub fn fail_presign_write_for(&self, content_type: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .presign_write_content_types
            .insert(content_type.into());
    }

    /// Make `presign_read` fail for `key`.
    pub fn fail_presign_read_for(&self, key: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .presign_read_keys
            .insert(key.into());
    }

    /// Make `delete` fail for `key`.
    pub fn fail_delete_for(&self, key: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delete_keys
            .insert(key.into());
    }

    /// Provider calls made so far.
    #[must_use]
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            presign_write: self.presign_write_calls.load(Ordering::SeqCst),
            presign_read: self.presign_read_calls.load(Ordering::SeqCst),
            list: self.list_calls.load(Ordering::SeqCst),
            stat: self.stat_calls.load(Ordering::SeqCst),
            delete: self.delete_calls.load(Ordering::SeqCst),
        }
    }

    fn signed_url(&self, method: &str, key: &str, ttl: Duration) -> PresignedUrl {
        PresignedUrl {
            url: format!(
                "{}/{key}?X-Amz-Expires={}&X-Amz-Signature=memory",
                self.base_url,
                ttl.as_secs()
            ),
            method: method.to_string(),
            expires_at: expires_at(ttl),
            headers: HashMap::new(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn presign_write(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        self.presign_write_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .presign_write_content_types
            .contains(content_type);
        if failing {
            return Err(StorageError::operation("injected presign_write failure"));
        }

        let mut presigned = self.signed_url("PUT", key, ttl);
        presigned
            .headers
            .insert("Content-Type".to_string(), content_type.to_string());
        Ok(presigned)
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        self.presign_read_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .presign_read_keys
            .contains(key);
        if failing {
            return Err(StorageError::operation("injected presign_read failure"));
        }
        Ok(self.signed_url("GET", key, ttl))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| ObjectEntry {
                key: key.clone(),
                size: obj.size,
                last_modified: Some(obj.last_modified),
                etag: Some(format!("\"{:x}\"", obj.size)),
            })
            .collect())
    }

    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        let obj = objects
            .get(key)
            .ok_or_else(|| StorageError::not_found(key))?;
        Ok(ObjectMeta {
            key: key.to_string(),
            size: obj.size,
            content_type: Some(obj.content_type.clone()),
            last_modified: Some(obj.last_modified),
            etag: Some(format!("\"{:x}\"", obj.size)),
            user_metadata: HashMap::new(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delete_keys
            .contains(key);
        if failing {
            return Err(StorageError::operation("injected delete failure"));
        }
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_respects_prefix() {
        let store = MemoryStore::new();
        store.put("uploads/anonymous/a.png", 10, "image/png");
        store.put("uploads/anonymous/b.png", 20, "image/png");
        store.put("uploads/other.png", 30, "image/png");

        let entries = store.list("uploads/anonymous/").await.expect("list");
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["uploads/anonymous/a.png", "uploads/anonymous/b.png"]);
        assert_eq!(store.calls().list, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let store = MemoryStore::new();
        store.delete("uploads/anonymous/missing.png").await.expect("idempotent");
        assert_eq!(store.calls().delete, 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.fail_presign_write_for("application/x-broken");
        store.fail_delete_for("uploads/x");

        assert!(
            store
                .presign_write("k", "application/x-broken", Duration::from_secs(300))
                .await
                .is_err()
        );
        assert!(store.delete("uploads/x").await.is_err());
        assert_eq!(store.calls().total(), 2);
    }
}
