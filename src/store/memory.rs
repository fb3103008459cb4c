use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::{CachedFeed, FeedImage};
use crate::store::{FeedStore, ImageDataStore, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    feed: Option<CachedFeed>,
    images: HashMap<Url, Bytes>,
}

/// In-memory store, mainly for composition roots that do not want a file on
/// disk and for tests. Operations complete immediately under one lock, which
/// serializes them.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FeedStore for InMemoryStore {
    async fn delete_cached_feed(&self) -> StoreResult<()> {
        self.lock().feed = None;
        Ok(())
    }

    async fn insert(&self, feed: Vec<FeedImage>, timestamp: DateTime<Utc>) -> StoreResult<()> {
        self.lock().feed = Some(CachedFeed { feed, timestamp });
        Ok(())
    }

    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        Ok(self.lock().feed.clone())
    }
}

#[async_trait]
impl ImageDataStore for InMemoryStore {
    async fn insert_data(&self, url: &Url, data: Bytes) -> StoreResult<()> {
        self.lock().images.insert(url.clone(), data);
        Ok(())
    }

    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        Ok(self.lock().images.get(url).cloned())
    }
}
