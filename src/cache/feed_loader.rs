use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::cache::policy::FeedCachePolicy;
use crate::clock::Clock;
use crate::domain::FeedImage;
use crate::loader::{FeedCache, FeedLoader};
use crate::store::{FeedStore, StoreError};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to save feed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load feed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("failed to validate feed cache: {0}")]
    Store(#[from] StoreError),
}

/// Feed cache over a [`FeedStore`], applying the freshness policy on reads
/// and offering an explicit repair operation.
///
/// Failures are local to each call; retry policy belongs to the caller.
pub struct LocalFeedLoader<S, C> {
    store: Arc<S>,
    clock: C,
}

impl<S, C> LocalFeedLoader<S, C>
where
    S: FeedStore,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    /// Replaces the cached snapshot with `feed`, stamped with the current
    /// time. The previous snapshot is deleted first; a failed deletion
    /// aborts the save without attempting the insert.
    pub async fn save(&self, feed: Vec<FeedImage>) -> Result<(), SaveError> {
        self.store.delete_cached_feed().await?;
        self.store.insert(feed, self.clock.now()).await?;
        Ok(())
    }

    /// Returns the cached feed when fresh, in stored order. An absent or
    /// expired snapshot reads as an empty feed; expiry never deletes here,
    /// that is [`validate_cache`](Self::validate_cache)'s job.
    pub async fn load(&self) -> Result<Vec<FeedImage>, LoadError> {
        match self.store.retrieve().await? {
            Some(cached) if FeedCachePolicy::is_fresh(cached.timestamp, self.clock.now()) => {
                Ok(cached.feed)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Deletes the snapshot when it is unreadable or expired. The only
    /// operation that mutates the store to repair invalid state; meant for
    /// lifecycle checkpoints such as app backgrounding.
    pub async fn validate_cache(&self) -> Result<(), ValidateError> {
        let needs_repair = match self.store.retrieve().await {
            Err(error) => {
                debug!(%error, "feed cache unreadable, deleting");
                true
            }
            Ok(Some(cached)) if !FeedCachePolicy::is_fresh(cached.timestamp, self.clock.now()) => {
                debug!(timestamp = %cached.timestamp, "feed cache expired, deleting");
                true
            }
            Ok(_) => false,
        };

        if needs_repair {
            self.store.delete_cached_feed().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S, C> FeedLoader for LocalFeedLoader<S, C>
where
    S: FeedStore,
    C: Clock,
{
    type Error = LoadError;

    async fn load_feed(&self) -> Result<Vec<FeedImage>, LoadError> {
        self.load().await
    }
}

#[async_trait]
impl<S, C> FeedCache for LocalFeedLoader<S, C>
where
    S: FeedStore,
    C: Clock,
{
    type Error = SaveError;

    async fn save_feed(&self, feed: Vec<FeedImage>) -> Result<(), SaveError> {
        self.save(feed).await
    }
}
