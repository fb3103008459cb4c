use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::remote::{HttpClient, HttpError, HttpResponse};

pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent("freshet/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(HttpError::new)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(HttpError::new)?;

        Ok(HttpResponse { status, body })
    }
}
