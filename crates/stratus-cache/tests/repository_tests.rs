//! Integration tests for ListingCache
//!
//! Each test builds a fresh in-memory SQLite database and a scripted
//! provider that counts how often it is called, so cache hits and misses
//! are observable from the outside.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use stratus_cache::{DatabasePool, ListingCache};
use stratus_core::domain::{RemoteFile, RemoteFolder, RemoteItem, RemoteListing, SyncError};
use stratus_core::ports::remote_provider::TransferProgress;
use stratus_core::ports::IRemoteProvider;

// ============================================================================
// Test provider
// ============================================================================

/// A provider serving scripted listings while counting calls
#[derive(Default)]
struct CountingProvider {
    listings: HashMap<String, RemoteListing>,
    items: HashMap<String, RemoteItem>,
    list_calls: AtomicUsize,
    item_calls: AtomicUsize,
}

impl CountingProvider {
    fn with_listing(mut self, folder_id: &str, listing: RemoteListing) -> Self {
        self.listings.insert(folder_id.to_string(), listing);
        self
    }

    fn with_item(mut self, item: RemoteItem) -> Self {
        self.items.insert(item.id().to_string(), item);
        self
    }
}

#[async_trait::async_trait]
impl IRemoteProvider for CountingProvider {
    async fn list_children(&self, folder_id: &str) -> Result<RemoteListing, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.listings
            .get(folder_id)
            .cloned()
            .ok_or_else(|| SyncError::RemoteNotFound(folder_id.to_string()))
    }

    async fn get_item(&self, id: &str) -> Result<RemoteItem, SyncError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        self.items
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::RemoteNotFound(id.to_string()))
    }

    async fn create_file(
        &self,
        _folder_id: &str,
        _local_path: &Path,
        _progress: TransferProgress<'_>,
    ) -> Result<RemoteFile, SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn update_file(
        &self,
        _file_id: &str,
        _local_path: &Path,
        _progress: TransferProgress<'_>,
    ) -> Result<RemoteFile, SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn download_file(
        &self,
        _file_id: &str,
        _local_path: &Path,
        _progress: TransferProgress<'_>,
    ) -> Result<(), SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn create_folder(
        &self,
        _parent_id: &str,
        _name: &str,
    ) -> Result<RemoteFolder, SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn trash_item(&self, _id: &str) -> Result<(), SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn move_item(&self, _id: &str, _new_parent_id: &str) -> Result<RemoteItem, SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn list_trash(&self) -> Result<RemoteListing, SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }

    async fn empty_trash(&self) -> Result<(), SyncError> {
        Err(SyncError::RemoteOperationFailed("not scripted".into()))
    }
}

// ============================================================================
// Test helpers
// ============================================================================

fn sample_listing() -> RemoteListing {
    RemoteListing {
        files: vec![RemoteFile {
            id: "f1".to_string(),
            name: "a.txt".to_string(),
            modified: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            size: 128,
        }],
        folders: vec![RemoteFolder {
            id: "g1".to_string(),
            name: "sub".to_string(),
        }],
    }
}

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

async fn open_cache(
    pool: sqlx::SqlitePool,
    provider: Arc<CountingProvider>,
    ttl: Duration,
) -> ListingCache {
    ListingCache::open(pool, provider, ttl, DAY)
        .await
        .expect("failed to open cache")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_get_children_single_call_within_ttl() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));
    let cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;

    let first = cache.get_children("root").await.unwrap();
    let second = cache.get_children("root").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_children_expired_ttl_refetches() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));
    let cache = open_cache(pool.pool().clone(), provider.clone(), Duration::ZERO).await;

    cache.get_children("root").await.unwrap();
    cache.get_children("root").await.unwrap();

    assert_eq!(provider.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));
    let cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;

    cache.get_children("root").await.unwrap();
    cache.invalidate("root").await;
    cache.get_children("root").await.unwrap();

    assert_eq!(provider.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_children_resolvable_by_id_without_provider_call() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));
    let cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;

    cache.get_children("root").await.unwrap();

    // Both children were written as item rows by the listing fetch
    let file = cache.get_item("f1").await.unwrap();
    assert_eq!(file.name(), "a.txt");
    let folder = cache.get_item("g1").await.unwrap();
    assert!(folder.is_folder());

    assert_eq!(provider.item_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_get_item_miss_calls_provider_then_caches() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let item = RemoteItem::Folder(RemoteFolder {
        id: "g9".to_string(),
        name: "projects".to_string(),
    });
    let provider = Arc::new(CountingProvider::default().with_item(item));
    let cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;

    cache.get_item("g9").await.unwrap();
    cache.get_item("g9").await.unwrap();

    assert_eq!(provider.item_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_item_unknown_id_propagates_not_found() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default());
    let cache = open_cache(pool.pool().clone(), provider, DAY).await;

    let err = cache.get_item("missing").await.unwrap_err();
    assert!(matches!(err, SyncError::RemoteNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_clear_all_drops_entries() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));
    let mut cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;

    cache.get_children("root").await.unwrap();
    cache.clear_all().await.unwrap();
    cache.get_children("root").await.unwrap();

    assert_eq!(provider.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_epoch_rollover_drops_entries_on_open() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));

    {
        let cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;
        cache.get_children("root").await.unwrap();
    }

    // Re-open with a zero epoch period: the stored epoch is already older
    // than the bound, so the cache must start empty.
    let cache = ListingCache::open(
        pool.pool().clone(),
        provider.clone(),
        DAY,
        Duration::ZERO,
    )
    .await
    .unwrap();
    cache.get_children("root").await.unwrap();

    assert_eq!(provider.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_corrupt_row_degrades_to_miss() {
    let pool = DatabasePool::in_memory().await.unwrap();
    let provider = Arc::new(CountingProvider::default().with_listing("root", sample_listing()));
    let cache = open_cache(pool.pool().clone(), provider.clone(), DAY).await;

    cache.get_children("root").await.unwrap();

    // Corrupt the stored payload behind the cache's back
    sqlx::query("UPDATE listings SET payload = 'not json' WHERE folder_id = 'root'")
        .execute(pool.pool())
        .await
        .unwrap();

    // The unreadable row is treated as a miss, not an error
    let listing = cache.get_children("root").await.unwrap();
    assert_eq!(listing.files.len(), 1);
    assert_eq!(provider.list_calls.load(Ordering::SeqCst), 2);
}
