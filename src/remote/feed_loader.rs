use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::domain::FeedImage;
use crate::loader::FeedLoader;
use crate::remote::{HttpClient, HttpResponse, RemoteError};

const OK: u16 = 200;

#[derive(Debug, Deserialize)]
struct FeedPayload {
    items: Vec<RemoteFeedItem>,
}

#[derive(Debug, Deserialize)]
struct RemoteFeedItem {
    id: Uuid,
    image: Url,
    description: Option<String>,
    location: Option<String>,
}

impl From<RemoteFeedItem> for FeedImage {
    fn from(item: RemoteFeedItem) -> Self {
        Self {
            id: item.id,
            url: item.image,
            description: item.description,
            location: item.location,
        }
    }
}

/// Loads the feed from a fixed endpoint. Transport failures map to
/// [`RemoteError::Connectivity`]; anything other than a 200 with a valid
/// `{"items": [...]}` payload maps to [`RemoteError::InvalidData`].
pub struct RemoteFeedLoader<H> {
    client: Arc<H>,
    url: Url,
}

impl<H> RemoteFeedLoader<H>
where
    H: HttpClient,
{
    pub fn new(client: Arc<H>, url: Url) -> Self {
        Self { client, url }
    }

    pub async fn load(&self) -> Result<Vec<FeedImage>, RemoteError> {
        let response = self.client.get(&self.url).await.map_err(|error| {
            debug!(%error, url = %self.url, "feed request failed");
            RemoteError::Connectivity
        })?;
        map_feed(response)
    }
}

fn map_feed(response: HttpResponse) -> Result<Vec<FeedImage>, RemoteError> {
    if response.status != OK {
        return Err(RemoteError::InvalidData);
    }
    let payload: FeedPayload =
        serde_json::from_slice(&response.body).map_err(|_| RemoteError::InvalidData)?;
    Ok(payload.items.into_iter().map(Into::into).collect())
}

#[async_trait]
impl<H> FeedLoader for RemoteFeedLoader<H>
where
    H: HttpClient,
{
    type Error = RemoteError;

    async fn load_feed(&self) -> Result<Vec<FeedImage>, RemoteError> {
        self.load().await
    }
}
