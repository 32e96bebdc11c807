use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::api::binance::{BINANCE_API_BASE, BINANCE_TESTNET_BASE};
use crate::indicators::IndicatorConfig;
use crate::models::KlineInterval;
use crate::strategy::SignalConfig;

const DEFAULT_CONFIG_FILE: &str = "candlebot";
const ENV_PREFIX: &str = "CANDLEBOT";

/// Runtime settings for one trading bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub symbol: String,
    pub interval: KlineInterval,
    /// Candles requested per tick
    pub candle_limit: usize,
    /// Base-asset amount per order
    pub trade_quantity: f64,
    pub tick_interval_secs: u64,
    /// Market data host
    pub api_base_url: String,
    /// Per-request HTTP timeout for exchange calls
    pub request_timeout_secs: u64,
    /// Exchange API key, only needed for live orders
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    /// Route live orders to the spot testnet instead of `api_base_url`
    pub testnet: bool,
    pub indicators: IndicatorConfig,
    pub signals: SignalConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: KlineInterval::OneMinute,
            candle_limit: 500,
            trade_quantity: 0.001,
            tick_interval_secs: 60,
            api_base_url: BINANCE_API_BASE.to_string(),
            request_timeout_secs: 30,
            api_key: None,
            api_secret: None,
            testnet: true,
            indicators: IndicatorConfig::default(),
            signals: SignalConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load settings: defaults, then `candlebot.toml` (or `path`), then
    /// `CANDLEBOT_*` environment variables. Nested keys use `__`, e.g.
    /// `CANDLEBOT_INDICATORS__RSI_PERIOD=21`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut config: BotConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;

        // The exchange's own variable names, as in a plain `.env`
        if config.api_key.is_none() {
            config.api_key = std::env::var("BINANCE_API_KEY").ok();
        }
        if config.api_secret.is_none() {
            config.api_secret = std::env::var("BINANCE_API_SECRET").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.symbol.trim().is_empty(), "symbol must not be empty");
        ensure!(
            self.trade_quantity.is_finite() && self.trade_quantity > 0.0,
            "trade_quantity must be positive, got {}",
            self.trade_quantity
        );
        ensure!(self.tick_interval_secs > 0, "tick_interval_secs must be positive");
        ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive"
        );

        let indicators = &self.indicators;
        for (name, period) in [
            ("sma_period", indicators.sma_period),
            ("ema_period", indicators.ema_period),
            ("short_ma_period", indicators.short_ma_period),
            ("long_ma_period", indicators.long_ma_period),
            ("rsi_period", indicators.rsi_period),
            ("macd_fast", indicators.macd_fast),
            ("macd_slow", indicators.macd_slow),
            ("macd_signal", indicators.macd_signal),
            ("bollinger_period", indicators.bollinger_period),
            ("supertrend_atr_period", indicators.supertrend_atr_period),
        ] {
            ensure!(period >= 1, "indicators.{} must be at least 1", name);
        }
        ensure!(
            indicators.macd_fast < indicators.macd_slow,
            "indicators.macd_fast ({}) must be below macd_slow ({})",
            indicators.macd_fast,
            indicators.macd_slow
        );
        ensure!(
            self.signals.rsi_oversold < self.signals.rsi_overbought,
            "signals.rsi_oversold ({}) must be below rsi_overbought ({})",
            self.signals.rsi_oversold,
            self.signals.rsi_overbought
        );

        ensure!(
            self.candle_limit >= self.min_candles_required(),
            "candle_limit {} is below the {} candles the signal rules need",
            self.candle_limit,
            self.min_candles_required()
        );
        Ok(())
    }

    /// Candles needed before every indicator the signal rules read is defined
    pub fn min_candles_required(&self) -> usize {
        let indicators = &self.indicators;
        [
            indicators.rsi_period + 1,
            indicators.bollinger_period,
            indicators.short_ma_period,
            indicators.long_ma_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Host that receives signed orders
    pub fn order_base_url(&self) -> &str {
        if self.testnet {
            BINANCE_TESTNET_BASE
        } else {
            &self.api_base_url
        }
    }

    /// API key and secret, required before trading live
    pub fn credentials(&self) -> anyhow::Result<(&str, &str)> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .context("api_key is not set (CANDLEBOT_API_KEY or BINANCE_API_KEY)")?;
        let secret = self
            .api_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("api_secret is not set (CANDLEBOT_API_SECRET or BINANCE_API_SECRET)")?;
        Ok((key, secret))
    }
}
