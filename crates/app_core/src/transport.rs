//! Manifest and image transport over HTTP

use crate::error::ViewerError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches manifest text from a locator
#[async_trait]
pub trait ManifestTransport: Send + Sync {
    async fn fetch_text(&self, locator: &str) -> Result<String, ViewerError>;
}

/// Fetches page image bytes; returns the number of bytes received
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, src: &str) -> Result<usize, ViewerError>;
}

/// Plain HTTP GET transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ViewerError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("iiif-manga-viewer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, locator: &str) -> Result<reqwest::Response, ViewerError> {
        let url = Url::parse(locator)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ViewerError::Transport(format!(
                "unsupported scheme `{}` in {}",
                url.scheme(),
                locator
            )));
        }
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response)
    }
}

#[async_trait]
impl ManifestTransport for HttpTransport {
    async fn fetch_text(&self, locator: &str) -> Result<String, ViewerError> {
        tracing::debug!(locator, "GET manifest");
        let text = self.get(locator).await?.text().await?;
        tracing::debug!(locator, bytes = text.len(), "manifest received");
        Ok(text)
    }
}

#[async_trait]
impl ImageFetcher for HttpTransport {
    async fn fetch_image(&self, src: &str) -> Result<usize, ViewerError> {
        let response = self.get(src).await.map_err(|e| ViewerError::ImageFetch {
            src: src.to_string(),
            message: e.to_string(),
        })?;
        let bytes = response.bytes().await?;
        Ok(bytes.len())
    }
}
