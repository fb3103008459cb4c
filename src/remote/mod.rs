pub mod feed_loader;
pub mod http_client;
pub mod image_loader;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

pub use feed_loader::RemoteFeedLoader;
pub use http_client::ReqwestHttpClient;
pub use image_loader::RemoteImageDataLoader;

/// Raw HTTP response as the remote loaders see it. Transport details beyond
/// status and body are out of scope here.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Opaque transport failure from an [`HttpClient`].
#[derive(Debug, Error)]
#[error("http request failed: {0}")]
pub struct HttpError(anyhow::Error);

impl HttpError {
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self(cause.into())
    }
}

/// The "fetch bytes from a URL" primitive the remote loaders are built on.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, HttpError>;
}

/// Error surface of the remote loaders: transport problems and unusable
/// responses collapse into two stable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("could not reach the server")]
    Connectivity,
    #[error("server response was not usable")]
    InvalidData,
}
