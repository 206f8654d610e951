//! Test doubles for the network seams.

use crate::api::{FetchedPage, PageFetcher};
use crate::error::TrackError;
use crate::rates::RateSource;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Minimal product page with the given title and offscreen price text.
pub fn product_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <span id="productTitle">  {title}  </span>
            <div id="imgTagWrapperId"><img src="https://img.example.com/main.jpg"></div>
            <div id="corePrice_feature_div"><span class="a-offscreen">{price}</span></div>
        </body></html>"#
    )
}

/// Serves canned responses in order; the last one repeats.
#[derive(Debug)]
pub struct StubFetcher {
    responses: Mutex<VecDeque<Result<FetchedPage, String>>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(responses: Vec<Result<FetchedPage, String>>) -> Self {
        StubFetcher {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn page(status: u16, body: &str) -> FetchedPage {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html;charset=UTF-8"));
        FetchedPage {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn ok(body: impl AsRef<str>) -> Self {
        Self::new(vec![Ok(Self::page(200, body.as_ref()))])
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::new(vec![Ok(Self::page(status, body))])
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(vec![Err(reason.to_string())])
    }

    pub fn sequence(bodies: Vec<String>) -> Self {
        Self::new(bodies.iter().map(|b| Ok(Self::page(200, b))).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, TrackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        };
        response.map_err(|reason| TrackError::Transport {
            url: url.to_string(),
            reason,
        })
    }
}

/// Rate source that always answers with the same rate.
#[derive(Debug)]
pub struct FixedRate {
    rate: Decimal,
    calls: AtomicUsize,
}

impl FixedRate {
    pub fn new(rate: Decimal) -> Self {
        FixedRate {
            rate,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RateSource for FixedRate {
    async fn reference_rate(&self, _fallback: Decimal) -> Decimal {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rate
    }
}
