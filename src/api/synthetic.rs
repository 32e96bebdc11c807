use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::CandleSource;
use crate::error::SourceError;
use crate::models::{Candle, KlineInterval};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Sideways/choppy market around the starting price
    Sideways,
    /// Large swings (±5% per candle)
    Volatile,
}

impl FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uptrend" | "up" => Ok(MarketScenario::Uptrend),
            "downtrend" | "down" => Ok(MarketScenario::Downtrend),
            "sideways" => Ok(MarketScenario::Sideways),
            "volatile" => Ok(MarketScenario::Volatile),
            other => Err(format!("unknown market scenario '{}'", other)),
        }
    }
}

struct FeedState {
    rng: StdRng,
    candles: Vec<Candle>,
    price: f64,
}

/// Offline candle feed: a seeded random walk that grows by one candle per fetch
///
/// Reproducible for a given seed, so runs and tests see the same prices.
pub struct SyntheticCandleSource {
    scenario: MarketScenario,
    base_price: f64,
    base_volume: f64,
    start_time: DateTime<Utc>,
    state: Mutex<FeedState>,
}

impl SyntheticCandleSource {
    /// Create a new feed with a seed for reproducibility
    pub fn new(seed: u64, scenario: MarketScenario) -> Self {
        let base_price = 150.0;
        Self {
            scenario,
            base_price,
            base_volume: 1_000_000.0,
            start_time: Utc
                .timestamp_opt(1_700_000_000, 0)
                .single()
                .unwrap_or_else(Utc::now),
            state: Mutex::new(FeedState {
                rng: StdRng::seed_from_u64(seed),
                candles: Vec::new(),
                price: base_price,
            }),
        }
    }

    /// Pre-generate `count` candles so the first fetch already has history
    pub fn with_history(self, count: usize, interval: KlineInterval) -> Self {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            for _ in 0..count {
                self.advance(&mut state, interval);
            }
        }
        self
    }

    /// Number of candles generated so far
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .candles
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn advance(&self, state: &mut FeedState, interval: KlineInterval) {
        let change = match self.scenario {
            // +/-0.2% drift per candle, ±0.1% noise so the trend is dominant
            MarketScenario::Uptrend => state.price * (0.002 + state.rng.gen_range(-0.001..0.001)),
            MarketScenario::Downtrend => {
                state.price * (-0.002 + state.rng.gen_range(-0.001..0.001))
            }
            MarketScenario::Sideways => {
                let reversion = (self.base_price - state.price) * 0.1;
                reversion + state.price * state.rng.gen_range(-0.01..0.01)
            }
            MarketScenario::Volatile => state.price * state.rng.gen_range(-0.05..0.05),
        };

        let open = state.price;
        // Prevent price from going too low
        let close = (open + change).max(self.base_price * 0.5);
        let wick = open.max(close) * state.rng.gen_range(0.0..0.003);
        let volume = self.base_volume * state.rng.gen_range(0.5..1.5);

        let index = state.candles.len() as i64;
        state.candles.push(Candle {
            timestamp: self.start_time + Duration::seconds(index * interval.as_secs()),
            open,
            high: open.max(close) + wick,
            low: open.min(close) - wick,
            close,
            volume,
        });
        state.price = close;
    }
}

impl CandleSource for SyntheticCandleSource {
    async fn fetch(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, SourceError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.advance(&mut state, interval);

        let start = state.candles.len().saturating_sub(limit);
        let window = state.candles[start..].to_vec();

        tracing::debug!(symbol, count = window.len(), "Generated synthetic candles");
        Ok(window)
    }
}
