//! Listing strategies.
//!
//! The default strategy fetches every key under the prefix, sorts newest
//! first and slices the requested page in memory. Cost is linear in the
//! number of stored objects. A cursor-based strategy can replace it behind
//! the same trait without touching the HTTP surface.

use std::cmp::Reverse;

use async_trait::async_trait;
use danmu_shared::types::PageRequest;

use crate::storage::{ObjectEntry, ObjectStore, StorageError};

/// One page of raw listing entries plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Entries on the requested page, newest first.
    pub items: Vec<ObjectEntry>,
    /// Number of entries across all pages.
    pub total: u64,
}

/// Produces a page of objects under a prefix.
#[async_trait]
pub trait ListingStrategy: Send + Sync {
    /// Return page `request` of the objects under `prefix`.
    async fn page(
        &self,
        store: &dyn ObjectStore,
        prefix: &str,
        request: PageRequest,
    ) -> Result<ListingPage, StorageError>;
}

/// Fetch-all-then-slice listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchAllListing;

#[async_trait]
impl ListingStrategy for FetchAllListing {
    async fn page(
        &self,
        store: &dyn ObjectStore,
        prefix: &str,
        request: PageRequest,
    ) -> Result<ListingPage, StorageError> {
        let mut entries: Vec<ObjectEntry> = store
            .list(prefix)
            .await?
            .into_iter()
            .filter(|e| e.key != prefix && !e.key.ends_with('/'))
            .collect();

        // Stable: equal timestamps keep provider order. Missing timestamps sort last.
        entries.sort_by_key(|e| Reverse(e.last_modified));

        let total = entries.len();
        let range = request.normalized().slice_range(total);
        let items = entries.drain(range).collect();

        Ok(ListingPage {
            items,
            total: total as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn seeded(n: i64) -> MemoryStore {
        let store = MemoryStore::new();
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        for i in 0..n {
            store.put_at(
                format!("uploads/anonymous/{i:03}.png"),
                10,
                "image/png",
                base + Duration::minutes(i),
            );
        }
        store
    }

    #[tokio::test]
    async fn test_newest_first_page_two() {
        let store = seeded(25);
        let page = FetchAllListing
            .page(&store, "uploads/anonymous/", PageRequest::from_query(Some(2), Some(10)))
            .await
            .unwrap();

        assert_eq!(page.total, 25);
        let keys: Vec<_> = page.items.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys[0], "uploads/anonymous/014.png");
        assert_eq!(keys[9], "uploads/anonymous/005.png");
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let store = seeded(3);
        let page = FetchAllListing
            .page(&store, "uploads/anonymous/", PageRequest::from_query(Some(5), Some(10)))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_excludes_prefix_and_directory_markers() {
        let store = seeded(2);
        store.put("uploads/anonymous/", 0, "application/x-directory");
        store.put("uploads/anonymous/folder/", 0, "application/x-directory");

        let page = FetchAllListing
            .page(&store, "uploads/anonymous/", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|e| !e.key.ends_with('/')));
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_provider_order() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        store.put_at("uploads/anonymous/a.png", 1, "image/png", at);
        store.put_at("uploads/anonymous/b.png", 1, "image/png", at);
        store.put_at("uploads/anonymous/c.png", 1, "image/png", at);

        let page = FetchAllListing
            .page(&store, "uploads/anonymous/", PageRequest::default())
            .await
            .unwrap();
        let keys: Vec<_> = page.items.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "uploads/anonymous/a.png",
                "uploads/anonymous/b.png",
                "uploads/anonymous/c.png"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_prefix_listing() {
        let store = MemoryStore::new();
        let page = FetchAllListing
            .page(&store, "uploads/anonymous/", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }
}
