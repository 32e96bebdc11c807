use super::atr::calculate_atr_series;
use crate::models::Candle;

/// SuperTrend overlay built from true-range ATR bands around hl2
///
/// `upper = hl2 + multiplier * ATR`, `lower = hl2 - multiplier * ATR`.
/// The reported value is `upper` when the close breaks above it, otherwise
/// `lower`. Undefined until the ATR is.
pub fn calculate_supertrend_series(
    candles: &[Candle],
    atr_period: usize,
    multiplier: f64,
) -> Vec<Option<f64>> {
    calculate_atr_series(candles, atr_period)
        .into_iter()
        .zip(candles)
        .map(|(atr, candle)| {
            let atr = atr?;
            let hl2 = (candle.high + candle.low) / 2.0;
            let upper_band = hl2 + multiplier * atr;
            let lower_band = hl2 - multiplier * atr;

            Some(if candle.close > upper_band {
                upper_band
            } else {
                lower_band
            })
        })
        .collect()
}
