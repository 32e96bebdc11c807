// Technical indicators module
// SMA, EMA, RSI, MACD, Bollinger Bands, ATR and SuperTrend over candle series

pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod snapshot;
pub mod supertrend;

pub use atr::{calculate_atr_series, calculate_true_range_series};
pub use bollinger::{calculate_bollinger, calculate_bollinger_series, BollingerBands};
pub use macd::{calculate_macd_series, MacdSeries};
pub use moving_average::{
    calculate_ema_of_series, calculate_ema_series, calculate_sma, calculate_sma_series,
};
pub use rsi::{calculate_rsi, calculate_rsi_series};
pub use snapshot::{compute, IndicatorConfig, IndicatorSnapshot};
pub use supertrend::calculate_supertrend_series;
