// src/services/fetcher.rs

//! Page fetcher.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::WatcherConfig;
use crate::utils::http;

/// Source of the watched page's raw content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Retrieve the page body. Any failure is a [`AppError::Fetch`].
    async fn fetch(&self) -> Result<String>;
}

/// Fetches a fixed URL over HTTP.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    /// Create a fetcher for the configured page.
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Ok(Self::with_client(client, &config.url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(AppError::fetch_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        response.text().await.map_err(AppError::fetch_transport)
    }
}
