use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    calculate_bollinger_series, calculate_ema_series, calculate_macd_series,
    calculate_rsi_series, calculate_sma_series, calculate_supertrend_series,
};
use crate::models::Candle;

/// Window lengths and multipliers for every indicator in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_period: usize,
    pub ema_period: usize,
    pub short_ma_period: usize,
    pub long_ma_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub supertrend_atr_period: usize,
    pub supertrend_multiplier: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 20,
            ema_period: 20,
            short_ma_period: 5,
            long_ma_period: 15,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
            supertrend_atr_period: 14,
            supertrend_multiplier: 3.0,
        }
    }
}

/// Indicator values for a single candle
///
/// `None` marks a value still inside its warm-up period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_lower: Option<f64>,
    pub supertrend: Option<f64>,
}

/// Compute one snapshot per candle, index-aligned with the input
pub fn compute(candles: &[Candle], config: &IndicatorConfig) -> Vec<IndicatorSnapshot> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let sma = calculate_sma_series(&closes, config.sma_period);
    let ema = calculate_ema_series(&closes, config.ema_period);
    let sma_short = calculate_sma_series(&closes, config.short_ma_period);
    let sma_long = calculate_sma_series(&closes, config.long_ma_period);
    let rsi = calculate_rsi_series(&closes, config.rsi_period);
    let macd = calculate_macd_series(
        &closes,
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    );
    let bands = calculate_bollinger_series(&closes, config.bollinger_period, config.bollinger_k);
    let supertrend = calculate_supertrend_series(
        candles,
        config.supertrend_atr_period,
        config.supertrend_multiplier,
    );

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| IndicatorSnapshot {
            timestamp: candle.timestamp,
            close: candle.close,
            sma: sma[i],
            ema: ema[i],
            sma_short: sma_short[i],
            sma_long: sma_long[i],
            rsi: rsi[i],
            macd: macd.macd[i],
            macd_signal: macd.signal[i],
            macd_hist: macd.histogram[i],
            bb_upper: bands[i].map(|b| b.upper),
            bb_mid: bands[i].map(|b| b.mid),
            bb_lower: bands[i].map(|b| b.lower),
            supertrend: supertrend[i],
        })
        .collect()
}
