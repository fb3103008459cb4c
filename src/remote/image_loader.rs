use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::loader::ImageDataLoader;
use crate::remote::{HttpClient, RemoteError};

const OK: u16 = 200;

/// Fetches raw image bytes. A 200 with a non-empty body is the only valid
/// response shape.
pub struct RemoteImageDataLoader<H> {
    client: Arc<H>,
}

impl<H> RemoteImageDataLoader<H>
where
    H: HttpClient,
{
    pub fn new(client: Arc<H>) -> Self {
        Self { client }
    }

    pub async fn load_data(&self, url: &Url) -> Result<Bytes, RemoteError> {
        let response = self.client.get(url).await.map_err(|error| {
            debug!(%error, %url, "image request failed");
            RemoteError::Connectivity
        })?;

        if response.status == OK && !response.body.is_empty() {
            Ok(response.body)
        } else {
            Err(RemoteError::InvalidData)
        }
    }
}

#[async_trait]
impl<H> ImageDataLoader for RemoteImageDataLoader<H>
where
    H: HttpClient,
{
    type Error = RemoteError;

    async fn load_image_data(&self, url: &Url) -> Result<Bytes, RemoteError> {
        self.load_data(url).await
    }
}
