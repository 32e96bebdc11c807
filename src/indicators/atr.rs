/// Average True Range (ATR) indicator
///
/// Measures market volatility by averaging true ranges over a period.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// The first candle has no previous close, so its true range is High - Low.
/// The average is a plain rolling mean over `period` true ranges.
use crate::models::Candle;

/// True range of every candle, aligned with the input
pub fn calculate_true_range_series(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let range = candle.high - candle.low;
            match i.checked_sub(1).map(|prev| candles[prev].close) {
                Some(prev_close) => range
                    .max((candle.high - prev_close).abs())
                    .max((candle.low - prev_close).abs()),
                None => range,
            }
        })
        .collect()
}

/// ATR aligned with candles; the first `period - 1` entries are `None`
pub fn calculate_atr_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let true_ranges = calculate_true_range_series(candles);
    super::calculate_sma_series(&true_ranges, period)
}
