use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::domain::FeedImage;
use crate::loader::{FeedLoader, ImageDataLoader};

/// Two-source composite: try the primary, and only on failure run the
/// secondary, relaying its outcome verbatim. No chaining beyond one level
/// and no translation of either source's values.
///
/// Dropping the returned future before failover cancels whichever source is
/// active; a secondary is never started for a cancelled load.
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> Fallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P, S> FeedLoader for Fallback<P, S>
where
    P: FeedLoader,
    S: FeedLoader,
{
    type Error = S::Error;

    async fn load_feed(&self) -> Result<Vec<FeedImage>, S::Error> {
        match self.primary.load_feed().await {
            Ok(feed) => Ok(feed),
            Err(error) => {
                debug!(%error, "primary feed source failed, falling back");
                self.secondary.load_feed().await
            }
        }
    }
}

#[async_trait]
impl<P, S> ImageDataLoader for Fallback<P, S>
where
    P: ImageDataLoader,
    S: ImageDataLoader,
{
    type Error = S::Error;

    async fn load_image_data(&self, url: &Url) -> Result<Bytes, S::Error> {
        match self.primary.load_image_data(url).await {
            Ok(data) => Ok(data),
            Err(error) => {
                debug!(%error, %url, "primary image source failed, falling back");
                self.secondary.load_image_data(url).await
            }
        }
    }
}
