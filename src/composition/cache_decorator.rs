use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::domain::FeedImage;
use crate::loader::{FeedCache, FeedLoader, ImageDataCache, ImageDataLoader};

/// Decorates a loader so that every successful load is also written to a
/// cache sink. The write happens on a spawned task: the caller gets the
/// original value without waiting on it, and the sink's outcome is ignored
/// entirely. A failed load never touches the sink.
pub struct CacheDecorator<L, C> {
    loader: L,
    cache: Arc<C>,
}

impl<L, C> CacheDecorator<L, C> {
    pub fn new(loader: L, cache: Arc<C>) -> Self {
        Self { loader, cache }
    }
}

#[async_trait]
impl<L, C> FeedLoader for CacheDecorator<L, C>
where
    L: FeedLoader,
    C: FeedCache + 'static,
{
    type Error = L::Error;

    async fn load_feed(&self) -> Result<Vec<FeedImage>, L::Error> {
        let feed = self.loader.load_feed().await?;
        let cache = Arc::clone(&self.cache);
        let snapshot = feed.clone();
        tokio::spawn(async move {
            let _ = cache.save_feed(snapshot).await;
        });
        Ok(feed)
    }
}

#[async_trait]
impl<L, C> ImageDataLoader for CacheDecorator<L, C>
where
    L: ImageDataLoader,
    C: ImageDataCache + 'static,
{
    type Error = L::Error;

    async fn load_image_data(&self, url: &Url) -> Result<Bytes, L::Error> {
        let data = self.loader.load_image_data(url).await?;
        let cache = Arc::clone(&self.cache);
        let url = url.clone();
        let payload = data.clone();
        tokio::spawn(async move {
            let _ = cache.save_image_data(&url, payload).await;
        });
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::anyhow;
    use tokio::sync::Notify;
    use url::Url;
    use uuid::Uuid;

    use super::*;
    use crate::cache::{DataSaveError, SaveError};
    use crate::remote::RemoteError;
    use crate::store::StoreError;

    struct StubFeedLoader(Result<Vec<FeedImage>, RemoteError>);

    #[async_trait]
    impl FeedLoader for StubFeedLoader {
        type Error = RemoteError;

        async fn load_feed(&self) -> Result<Vec<FeedImage>, RemoteError> {
            self.0.clone()
        }
    }

    struct FeedCacheSpy {
        saved: Mutex<Vec<Vec<FeedImage>>>,
        notify: Notify,
        fail: bool,
    }

    impl FeedCacheSpy {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                saved: Mutex::new(Vec::new()),
                notify: Notify::new(),
                fail,
            })
        }
    }

    #[async_trait]
    impl FeedCache for FeedCacheSpy {
        type Error = SaveError;

        async fn save_feed(&self, feed: Vec<FeedImage>) -> Result<(), SaveError> {
            self.saved.lock().unwrap().push(feed);
            self.notify.notify_one();
            if self.fail {
                return Err(SaveError::Store(StoreError::new(anyhow!("sink failed"))));
            }
            Ok(())
        }
    }

    fn unique_feed() -> Vec<FeedImage> {
        vec![FeedImage::new(
            Uuid::new_v4(),
            Url::parse("https://example.com/1.png").unwrap(),
        )]
    }

    async fn wait_for(notify: &Notify) {
        tokio::time::timeout(Duration::from_secs(1), notify.notified())
            .await
            .expect("cache sink was never invoked");
    }

    #[tokio::test]
    async fn delivers_loaded_feed_and_saves_it() {
        let feed = unique_feed();
        let cache = FeedCacheSpy::new(false);
        let decorator = CacheDecorator::new(StubFeedLoader(Ok(feed.clone())), Arc::clone(&cache));

        let result = decorator.load_feed().await.unwrap();
        wait_for(&cache.notify).await;

        assert_eq!(result, feed);
        assert_eq!(*cache.saved.lock().unwrap(), vec![feed]);
    }

    #[tokio::test]
    async fn sink_failure_never_reaches_the_caller() {
        let feed = unique_feed();
        let cache = FeedCacheSpy::new(true);
        let decorator = CacheDecorator::new(StubFeedLoader(Ok(feed.clone())), Arc::clone(&cache));

        let result = decorator.load_feed().await.unwrap();
        wait_for(&cache.notify).await;

        assert_eq!(result, feed);
    }

    #[tokio::test]
    async fn failed_load_never_touches_the_sink() {
        let cache = FeedCacheSpy::new(false);
        let decorator = CacheDecorator::new(
            StubFeedLoader(Err(RemoteError::Connectivity)),
            Arc::clone(&cache),
        );

        let result = decorator.load_feed().await;
        tokio::task::yield_now().await;

        assert_eq!(result, Err(RemoteError::Connectivity));
        assert!(cache.saved.lock().unwrap().is_empty());
    }

    struct StubImageLoader(Result<Bytes, RemoteError>);

    #[async_trait]
    impl ImageDataLoader for StubImageLoader {
        type Error = RemoteError;

        async fn load_image_data(&self, _url: &Url) -> Result<Bytes, RemoteError> {
            self.0.clone()
        }
    }

    struct ImageCacheSpy {
        saved: Mutex<Vec<(Url, Bytes)>>,
        notify: Notify,
    }

    #[async_trait]
    impl ImageDataCache for ImageCacheSpy {
        type Error = DataSaveError;

        async fn save_image_data(&self, url: &Url, data: Bytes) -> Result<(), DataSaveError> {
            self.saved.lock().unwrap().push((url.clone(), data));
            self.notify.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_loaded_image_data_and_saves_it_under_its_url() {
        let url = Url::parse("https://example.com/image.png").unwrap();
        let data = Bytes::from_static(b"image bytes");
        let cache = Arc::new(ImageCacheSpy {
            saved: Mutex::new(Vec::new()),
            notify: Notify::new(),
        });
        let decorator =
            CacheDecorator::new(StubImageLoader(Ok(data.clone())), Arc::clone(&cache));

        let result = decorator.load_image_data(&url).await.unwrap();
        wait_for(&cache.notify).await;

        assert_eq!(result, data);
        assert_eq!(*cache.saved.lock().unwrap(), vec![(url, data)]);
    }
}
