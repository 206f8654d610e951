//! HTTP transport for product pages.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: the seam the scrape pipeline depends on
//! - [`HttpFetcher`]: the `reqwest` implementation used in production
//! - [`RequestProfile`]: the static browser-like headers sent with every
//!   request, passed in as an immutable value instead of living in a global
//!   session
//!
//! Fetching is a single attempt bounded by a timeout. Retrying is left to
//! whoever re-submits the tracking request.

use crate::error::TrackError;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Browser-like request headers.
///
/// `Accept-Encoding` is not listed: the client negotiates gzip, deflate and
/// brotli itself and decodes the body transparently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,
}

impl Default for RequestProfile {
    fn default() -> Self {
        RequestProfile {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,\
                     image/apng,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.9,hi;q=0.8".to_string(),
            referer: "https://www.google.com/".to_string(),
        }
    }
}

impl RequestProfile {
    fn headers(&self) -> Result<HeaderMap, TrackError> {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (ACCEPT, &self.accept),
            (ACCEPT_LANGUAGE, &self.accept_language),
            (REFERER, &self.referer),
        ] {
            let value = HeaderValue::from_str(value).map_err(|e| TrackError::Config {
                path: "request headers".to_string(),
                reason: format!("{name}: {e}"),
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// A fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for retrieving a page by URL.
///
/// Implementors return whatever the server answered, including error
/// statuses; only failures to get an answer at all are errors.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, TrackError>;
}

/// [`PageFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client that sends `profile` with every request and gives up
    /// after `timeout`.
    pub fn new(profile: &RequestProfile, timeout: Duration) -> Result<Self, TrackError> {
        let client = Client::builder()
            .user_agent(profile.user_agent.clone())
            .default_headers(profile.headers()?)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .timeout(timeout)
            .build()
            .map_err(|e| TrackError::Config {
                path: "http client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, TrackError> {
        let t0 = Instant::now();
        let transport = |e: reqwest::Error| TrackError::Transport {
            url: url.to_string(),
            reason: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Page request failed");
                return Err(transport(e));
            }
        };
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(transport)?;

        info!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(FetchedPage {
            status,
            headers,
            body,
        })
    }
}
