//! HTTP fetch client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};

use crate::error::{Error, Result};

/// Source of playlist and segment bodies.
///
/// The engine only talks to the network through this trait so the download
/// pipeline can run against an in-memory source in tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a text document (a playlist).
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String>;

    /// Fetch a binary body (a media segment).
    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// reqwest-backed [`Fetcher`] sending a fixed User-Agent.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Build a client that identifies itself with `user_agent`.
    pub fn new(user_agent: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, user_agent })
    }

    /// GET a URL, failing on non-2xx responses.
    async fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status: {} for {}", status, url);

        if !status.is_success() {
            return Err(Error::SegmentFetch(format!("HTTP {} for {}", status, url)));
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self.get(url, timeout).await?;
        Ok(response.text().await?)
    }

    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let response = self.get(url, timeout).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
