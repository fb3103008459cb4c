use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::domain::FeedImage;

/// Anything that can produce the feed: remote loader, local cache, or a
/// composite of the two. Composites and decorators are generic over this
/// seam, never over concrete loaders.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn load_feed(&self) -> Result<Vec<FeedImage>, Self::Error>;
}

/// Anything that can produce image bytes for a URL.
#[async_trait]
pub trait ImageDataLoader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn load_image_data(&self, url: &Url) -> Result<Bytes, Self::Error>;
}

#[async_trait]
impl<T: FeedLoader + ?Sized> FeedLoader for Arc<T> {
    type Error = T::Error;

    async fn load_feed(&self) -> Result<Vec<FeedImage>, Self::Error> {
        (**self).load_feed().await
    }
}

#[async_trait]
impl<T: ImageDataLoader + ?Sized> ImageDataLoader for Arc<T> {
    type Error = T::Error;

    async fn load_image_data(&self, url: &Url) -> Result<Bytes, Self::Error> {
        (**self).load_image_data(url).await
    }
}

/// Write side of a feed cache, used as the sink of the cache-write
/// decorator.
#[async_trait]
pub trait FeedCache: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn save_feed(&self, feed: Vec<FeedImage>) -> Result<(), Self::Error>;
}

/// Write side of an image data cache.
#[async_trait]
pub trait ImageDataCache: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn save_image_data(&self, url: &Url, data: Bytes) -> Result<(), Self::Error>;
}
