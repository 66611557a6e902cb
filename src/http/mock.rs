//! In-memory [`Fetcher`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::http::Fetcher;

#[derive(Debug, Clone)]
enum Route {
    Body { data: Vec<u8>, delay: Duration },
    Fail(String),
}

/// Serves canned bodies by exact URL, optionally after a delay.
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url` immediately.
    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.serve_after(url, body, Duration::ZERO);
    }

    /// Serve `body` at `url` after `delay`.
    pub fn serve_after(&self, url: &str, body: impl Into<Vec<u8>>, delay: Duration) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Body {
                data: body.into(),
                delay,
            },
        );
    }

    /// Make `url` fail like a network error.
    pub fn fail(&self, url: &str, reason: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail(reason.to_string()));
    }

    /// URLs requested so far, in request order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    async fn respond(&self, url: &str) -> Result<Vec<u8>> {
        self.hits.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url).cloned();
        match route {
            Some(Route::Body { data, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(data)
            }
            Some(Route::Fail(reason)) => Err(Error::SegmentFetch(reason)),
            None => Err(Error::SegmentFetch(format!("HTTP 404 Not Found for {}", url))),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        let body = self.respond(url).await?;
        String::from_utf8(body).map_err(|e| Error::SegmentFetch(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        self.respond(url).await
    }
}
