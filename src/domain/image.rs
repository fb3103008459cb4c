use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A single image entry in the feed.
///
/// Identity is the `id`; equality covers every field so tests can compare
/// whole snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedImage {
    pub id: Uuid,
    pub url: Url,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl FeedImage {
    pub fn new(id: Uuid, url: Url) -> Self {
        Self {
            id,
            url,
            description: None,
            location: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// One feed snapshot as held by a store: the images plus the instant the
/// snapshot was written. A store holds at most one of these at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFeed {
    pub feed: Vec<FeedImage>,
    pub timestamp: DateTime<Utc>,
}
