//! Check-then-fetch listing cache in front of a remote provider
//!
//! [`ListingCache`] answers `get_children` / `get_item` from SQLite when a
//! fresh entry exists, and falls through to the injected
//! [`IRemoteProvider`] otherwise, storing what it fetched. Every listing
//! write also writes one item row per child, so children can later be
//! resolved by id without refetching the parent listing.
//!
//! Staleness is bounded twice over: each entry expires individually under
//! the TTL, and the whole cache is dropped whenever the cache epoch rolls
//! over. Entries written under an older epoch are treated as misses even
//! if their TTL has not elapsed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use stratus_core::domain::{RemoteItem, RemoteListing, SyncError};
use stratus_core::ports::IRemoteProvider;

use crate::CacheError;

/// Meta-table key holding the current epoch instant
const EPOCH_KEY: &str = "epoch";

/// TTL-bounded cache of remote listings and items
///
/// Single-threaded callers only; reads and writes are not coordinated
/// beyond SQLite's own locking. Cache-store errors degrade to a miss and
/// are never surfaced to the engine.
pub struct ListingCache {
    pool: SqlitePool,
    provider: Arc<dyn IRemoteProvider>,
    ttl: chrono::Duration,
    /// The epoch instant all rows written by this process are tagged with
    epoch: String,
}

impl ListingCache {
    /// Opens the cache over an existing pool, rolling the epoch over if it
    /// has expired
    ///
    /// When `now - stored_epoch > epoch_period` every cached entry is
    /// dropped and a fresh epoch is written; this bounds total staleness
    /// even if individual entries were refreshed piecemeal.
    pub async fn open(
        pool: SqlitePool,
        provider: Arc<dyn IRemoteProvider>,
        ttl: Duration,
        epoch_period: Duration,
    ) -> Result<Self, CacheError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Serialization(format!("ttl out of range: {}", e)))?;
        let period = chrono::Duration::from_std(epoch_period)
            .map_err(|e| CacheError::Serialization(format!("epoch period out of range: {}", e)))?;

        let now = Utc::now();
        let stored: Option<String> = sqlx::query_scalar("SELECT value FROM meta WHERE key = ?")
            .bind(EPOCH_KEY)
            .fetch_optional(&pool)
            .await?;

        let epoch = match stored.as_deref().and_then(parse_instant) {
            Some(epoch) if now - epoch <= period => epoch.to_rfc3339(),
            Some(epoch) => {
                info!(
                    epoch = %epoch,
                    "Cache epoch expired, dropping all cached entries"
                );
                clear_store(&pool, &now.to_rfc3339()).await?;
                now.to_rfc3339()
            }
            None => {
                // Fresh database (or an unreadable epoch row): start a new epoch
                clear_store(&pool, &now.to_rfc3339()).await?;
                now.to_rfc3339()
            }
        };

        Ok(Self {
            pool,
            provider,
            ttl,
            epoch,
        })
    }

    /// Returns the children of a remote folder, from cache when fresh
    ///
    /// On a miss (absent, expired, older epoch, or unreadable row) the
    /// provider is called and the result stored: one listing row plus one
    /// item row per child.
    pub async fn get_children(&self, folder_id: &str) -> Result<RemoteListing, SyncError> {
        match self.load_listing(folder_id).await {
            Ok(Some(listing)) => {
                debug!(folder_id, "Listing cache hit");
                return Ok(listing);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(folder_id, error = %err, "Cache read failed, treating as miss");
            }
        }

        let listing = self.provider.list_children(folder_id).await?;

        if let Err(err) = self.store_listing(folder_id, &listing).await {
            warn!(folder_id, error = %err, "Failed to store listing in cache");
        }

        Ok(listing)
    }

    /// Resolves a single remote item by id, from cache when fresh
    pub async fn get_item(&self, id: &str) -> Result<RemoteItem, SyncError> {
        match self.load_item(id).await {
            Ok(Some(item)) => {
                debug!(id, "Item cache hit");
                return Ok(item);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(id, error = %err, "Cache read failed, treating as miss");
            }
        }

        let item = self.provider.get_item(id).await?;

        if let Err(err) = self.store_item(&item, None).await {
            warn!(id, error = %err, "Failed to store item in cache");
        }

        Ok(item)
    }

    /// Drops the cached entry (listing and item row) for one id
    ///
    /// Called immediately after any mutation of that id so later reads in
    /// the same run never observe pre-mutation state. Store errors are
    /// logged and swallowed.
    pub async fn invalidate(&self, id: &str) {
        let result: Result<(), CacheError> = async {
            sqlx::query("DELETE FROM listings WHERE folder_id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            sqlx::query("DELETE FROM items WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => debug!(id, "Invalidated cache entry"),
            Err(err) => warn!(id, error = %err, "Failed to invalidate cache entry"),
        }
    }

    /// Drops every cached entry and advances the cache epoch
    pub async fn clear_all(&mut self) -> Result<(), CacheError> {
        let now = Utc::now().to_rfc3339();
        clear_store(&self.pool, &now).await?;
        self.epoch = now;
        info!("Cache cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Store access
    // ------------------------------------------------------------------

    async fn load_listing(&self, folder_id: &str) -> Result<Option<RemoteListing>, CacheError> {
        let row = sqlx::query("SELECT payload, inserted_at, epoch FROM listings WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if !self.row_is_fresh(&row)? {
            return Ok(None);
        }

        let payload: String = row.get("payload");
        Ok(Some(serde_json::from_str(&payload)?))
    }

    async fn load_item(&self, id: &str) -> Result<Option<RemoteItem>, CacheError> {
        let row = sqlx::query("SELECT payload, inserted_at, epoch FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if !self.row_is_fresh(&row)? {
            return Ok(None);
        }

        let payload: String = row.get("payload");
        Ok(Some(serde_json::from_str(&payload)?))
    }

    async fn store_listing(
        &self,
        folder_id: &str,
        listing: &RemoteListing,
    ) -> Result<(), CacheError> {
        let now = Utc::now().to_rfc3339();
        let payload = serde_json::to_string(listing)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT OR REPLACE INTO listings (folder_id, payload, inserted_at, epoch) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(folder_id)
        .bind(&payload)
        .bind(&now)
        .bind(&self.epoch)
        .execute(&mut *tx)
        .await?;

        for item in listing.items() {
            let item_payload = serde_json::to_string(&item)?;
            sqlx::query(
                "INSERT OR REPLACE INTO items (id, parent_id, payload, inserted_at, epoch) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(item.id())
            .bind(folder_id)
            .bind(&item_payload)
            .bind(&now)
            .bind(&self.epoch)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn store_item(&self, item: &RemoteItem, parent_id: Option<&str>) -> Result<(), CacheError> {
        let now = Utc::now().to_rfc3339();
        let payload = serde_json::to_string(item)?;

        sqlx::query(
            "INSERT OR REPLACE INTO items (id, parent_id, payload, inserted_at, epoch) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(item.id())
        .bind(parent_id)
        .bind(&payload)
        .bind(&now)
        .bind(&self.epoch)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// A row is fresh when it carries the current epoch and its TTL has
    /// not elapsed
    fn row_is_fresh(&self, row: &sqlx::sqlite::SqliteRow) -> Result<bool, CacheError> {
        let epoch: String = row.get("epoch");
        if epoch != self.epoch {
            return Ok(false);
        }

        let inserted_at: String = row.get("inserted_at");
        let inserted = parse_instant(&inserted_at).ok_or_else(|| {
            CacheError::Serialization(format!("unreadable inserted_at: {}", inserted_at))
        })?;

        Ok(Utc::now() - inserted < self.ttl)
    }
}

/// Parses an RFC 3339 instant stored in a cache row
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Deletes every cached row and writes a fresh epoch
async fn clear_store(pool: &SqlitePool, epoch: &str) -> Result<(), CacheError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM listings").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
    sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)")
        .bind(EPOCH_KEY)
        .bind(epoch)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}
