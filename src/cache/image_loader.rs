use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::loader::{ImageDataCache, ImageDataLoader};
use crate::store::{ImageDataStore, StoreError};

/// Store failure and logical absence stay distinguishable: callers show a
/// retry affordance for the former and a placeholder for the latter.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("image cache lookup failed: {0}")]
    Store(#[from] StoreError),
    #[error("no cached image data for that url")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum DataSaveError {
    #[error("failed to cache image data: {0}")]
    Store(#[from] StoreError),
}

/// Image data cache over an [`ImageDataStore`].
///
/// Loads are plain futures: dropping one before completion cancels it and
/// no result is ever delivered for it.
pub struct LocalImageDataLoader<S> {
    store: Arc<S>,
}

impl<S> LocalImageDataLoader<S>
where
    S: ImageDataStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn load_data(&self, url: &Url) -> Result<Bytes, DataLoadError> {
        match self.store.retrieve_data(url).await? {
            Some(data) => Ok(data),
            None => Err(DataLoadError::NotFound),
        }
    }

    pub async fn save_data(&self, url: &Url, data: Bytes) -> Result<(), DataSaveError> {
        self.store.insert_data(url, data).await?;
        Ok(())
    }
}

#[async_trait]
impl<S> ImageDataLoader for LocalImageDataLoader<S>
where
    S: ImageDataStore,
{
    type Error = DataLoadError;

    async fn load_image_data(&self, url: &Url) -> Result<Bytes, DataLoadError> {
        self.load_data(url).await
    }
}

#[async_trait]
impl<S> ImageDataCache for LocalImageDataLoader<S>
where
    S: ImageDataStore,
{
    type Error = DataSaveError;

    async fn save_image_data(&self, url: &Url, data: Bytes) -> Result<(), DataSaveError> {
        self.save_data(url, data).await
    }
}
