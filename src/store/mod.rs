pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::domain::{CachedFeed, FeedImage};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Opaque store failure. The underlying cause is carried for diagnostics
/// but callers only get "operation failed" — there are no kinds to match on.
#[derive(Debug, Error)]
#[error("store operation failed: {0}")]
pub struct StoreError(anyhow::Error);

impl StoreError {
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self(cause.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for the single feed snapshot.
///
/// Implementations must execute operations one at a time, in submission
/// order, regardless of caller concurrency. A composite save
/// (delete then insert) must never interleave with a concurrent retrieve.
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn delete_cached_feed(&self) -> StoreResult<()>;

    /// Replaces any previous snapshot. Runs as delete-then-write: when the
    /// delete lands but the write fails, the store is left empty, not
    /// holding the old snapshot.
    async fn insert(&self, feed: Vec<FeedImage>, timestamp: DateTime<Utc>) -> StoreResult<()>;

    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>>;
}

/// Persistence for per-URL image payloads. Entries are independent;
/// overwriting one key never touches another.
#[async_trait]
pub trait ImageDataStore: Send + Sync {
    async fn insert_data(&self, url: &Url, data: Bytes) -> StoreResult<()>;

    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>>;
}
