use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use tokio::time::{sleep, Duration};

use super::CandleSource;
use crate::error::SourceError;
use crate::models::{Candle, KlineInterval};
use crate::strategy::validate_candle_order;

pub const BINANCE_API_BASE: &str = "https://api.binance.com";
pub const BINANCE_TESTNET_BASE: &str = "https://testnet.binance.vision";
/// Default per-request timeout for exchange calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const KLINES_PATH: &str = "/api/v3/klines";
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound the exchange accepts for `limit`
const MAX_LIMIT: usize = 1000;

/// Client for the public Binance klines endpoint
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

/// HTTP client shared by the exchange clients; every request is bounded by `timeout`
pub(crate) fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

impl BinanceClient {
    /// Create a client for `base_url` (mainnet, testnet, mock server)
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Create a client with the default timeout
    pub fn with_default_timeout(base_url: impl Into<String>) -> Result<Self, SourceError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_retry(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// Get candles for a symbol
    /// Includes retry logic with exponential backoff for transient failures
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, SourceError> {
        let mut attempt = 1;

        loop {
            match self.fetch_klines_once(symbol, interval, limit).await {
                Ok(candles) => {
                    if attempt > 1 {
                        tracing::info!(
                            "✓ Successfully fetched {} klines after {} attempts",
                            symbol,
                            attempt
                        );
                    }
                    return Ok(candles);
                }
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}. Retrying in {:?}...",
                        attempt,
                        self.max_retries,
                        symbol,
                        e,
                        backoff
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Internal method to fetch klines once (without retry logic)
    async fn fetch_klines_once(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, SourceError> {
        let url = format!("{}{}", self.base_url, KLINES_PATH);
        let limit = limit.clamp(1, MAX_LIMIT).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Vec<Value>> = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()?;

        if candles.is_empty() {
            return Err(SourceError::Empty {
                symbol: symbol.to_string(),
            });
        }
        validate_candle_order(&candles)?;

        tracing::debug!(symbol, interval = %interval, count = candles.len(), "Fetched klines");

        Ok(candles)
    }
}

impl CandleSource for BinanceClient {
    async fn fetch(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, SourceError> {
        self.get_klines(symbol, interval, limit).await
    }
}

/// Network failures (timeouts included), throttling and server errors are worth retrying
fn is_transient(error: &SourceError) -> bool {
    match error {
        SourceError::Request(_) => true,
        SourceError::Status { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Parse one kline row: `[open_time, open, high, low, close, volume, ...]`
/// with prices and volume encoded as strings
fn parse_kline(row: &[Value]) -> Result<Candle, SourceError> {
    if row.len() < 6 {
        return Err(SourceError::Malformed(format!(
            "expected at least 6 fields, got {}",
            row.len()
        )));
    }

    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| SourceError::Malformed(format!("bad open time: {}", row[0])))?;
    let timestamp = DateTime::from_timestamp_millis(open_time)
        .ok_or_else(|| SourceError::Malformed(format!("open time out of range: {}", open_time)))?;

    let number = |index: usize| -> Result<f64, SourceError> {
        let value = &row[index];
        let parsed = match value {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        parsed.ok_or_else(|| SourceError::Malformed(format!("bad number at {}: {}", index, value)))
    };

    Ok(Candle {
        timestamp,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}
