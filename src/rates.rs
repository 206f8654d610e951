//! USD→INR conversion rate lookup with a fallback.
//!
//! The live rate comes from a USD-indexed rate table such as
//! `https://api.exchangerate-api.com/v4/latest/USD`, of which only
//! `rates.INR` is read. A third-party outage must never block product
//! tracking, so every failure mode resolves to the caller's fallback rate.

use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Default rate table endpoint.
pub const DEFAULT_RATE_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Source of the USD→INR conversion rate.
pub trait RateSource {
    /// Current rate, or `fallback` when no live rate is available.
    async fn reference_rate(&self, fallback: Decimal) -> Decimal;
}

/// [`RateSource`] that queries a remote rate table once per call.
#[derive(Debug, Clone)]
pub struct CurrencyRateProvider {
    client: Client,
    endpoint: String,
}

impl CurrencyRateProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(CurrencyRateProvider {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn fetch_rate(&self) -> Result<Decimal, String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;
        let body: Value = response.json().await.map_err(|e| e.to_string())?;
        rate_from_body(&body).ok_or_else(|| "response has no usable rates.INR field".to_string())
    }
}

impl RateSource for CurrencyRateProvider {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn reference_rate(&self, fallback: Decimal) -> Decimal {
        let t0 = Instant::now();
        match self.fetch_rate().await {
            Ok(rate) => {
                info!(%rate, elapsed_ms = t0.elapsed().as_millis() as u64, "Fetched USD→INR rate");
                rate
            }
            Err(reason) => {
                warn!(%fallback, %reason, "Rate source unavailable; using fallback rate");
                fallback
            }
        }
    }
}

/// Read a positive `rates.INR` value out of a rate table response.
pub fn rate_from_body(body: &Value) -> Option<Decimal> {
    let Value::Number(number) = body.get("rates")?.get("INR")? else {
        return None;
    };
    let text = number.to_string();
    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()?;
    (rate > Decimal::ZERO).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const FALLBACK: Decimal = Decimal::from_parts(835, 0, 0, false, 1);

    /// Serve `body` with `status` to every connection, returning the endpoint URL.
    async fn serve_json(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/v4/latest/USD")
    }

    /// Accept connections and hold them open without ever answering.
    async fn serve_nothing() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}/v4/latest/USD")
    }

    #[test]
    fn test_rate_from_body() {
        let body = json!({"base": "USD", "rates": {"USD": 1, "INR": 83.12, "EUR": 0.92}});
        assert_eq!(rate_from_body(&body), Some(Decimal::new(8312, 2)));
    }

    #[test]
    fn test_rate_from_body_integer_value() {
        let body = json!({"rates": {"INR": 84}});
        assert_eq!(rate_from_body(&body), Some(Decimal::new(84, 0)));
    }

    #[test]
    fn test_rate_from_body_missing_or_unusable() {
        assert_eq!(rate_from_body(&json!({})), None);
        assert_eq!(rate_from_body(&json!({"rates": {"EUR": 0.92}})), None);
        assert_eq!(rate_from_body(&json!({"rates": {"INR": "83.1"}})), None);
        assert_eq!(rate_from_body(&json!({"rates": {"INR": 0}})), None);
    }

    #[tokio::test]
    async fn test_unreachable_source_returns_fallback() {
        let provider =
            CurrencyRateProvider::new("http://127.0.0.1:9/v4/latest/USD", Duration::from_secs(5)).unwrap();
        let fallback = Decimal::new(835, 1);
        assert_eq!(provider.reference_rate(fallback).await, fallback);
    }

    #[tokio::test]
    async fn test_live_rate_is_used() {
        let endpoint = serve_json("200 OK", r#"{"base":"USD","rates":{"INR":84.5}}"#).await;
        let provider = CurrencyRateProvider::new(endpoint, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.reference_rate(FALLBACK).await, Decimal::new(845, 1));
    }

    #[tokio::test]
    async fn test_silent_source_times_out_to_fallback() {
        let endpoint = serve_nothing().await;
        let provider = CurrencyRateProvider::new(endpoint, Duration::from_millis(200)).unwrap();

        let t0 = Instant::now();
        assert_eq!(provider.reference_rate(FALLBACK).await, FALLBACK);
        assert!(t0.elapsed() < Duration::from_secs(5), "timeout was not applied");
    }

    #[tokio::test]
    async fn test_missing_inr_returns_fallback() {
        let endpoint = serve_json("200 OK", r#"{"rates":{}}"#).await;
        let provider = CurrencyRateProvider::new(endpoint, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.reference_rate(FALLBACK).await, FALLBACK);
    }

    #[tokio::test]
    async fn test_error_status_returns_fallback() {
        let endpoint = serve_json("503 Service Unavailable", r#"{"rates":{"INR":84.5}}"#).await;
        let provider = CurrencyRateProvider::new(endpoint, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.reference_rate(FALLBACK).await, FALLBACK);
    }
}
