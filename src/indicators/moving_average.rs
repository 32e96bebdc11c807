/// Calculate Simple Moving Average (SMA)
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// SMA for every prefix of `prices`
///
/// Entry `i` is the mean of `prices[i + 1 - period..=i]`; the first
/// `period - 1` entries are `None`.
pub fn calculate_sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| calculate_sma(&prices[..=i], period))
        .collect()
}

/// EMA for every prefix of `prices`
///
/// Seeded with the SMA of the first `period` values, then smoothed with
/// `alpha = 2 / (period + 1)`.
pub fn calculate_ema_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; prices.len()];
    if period == 0 || prices.len() < period {
        return series;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Start with SMA
    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    series[period - 1] = Some(ema);

    for (i, price) in prices.iter().enumerate().skip(period) {
        ema = (price - ema) * multiplier + ema;
        series[i] = Some(ema);
    }

    series
}

/// EMA over a series that itself has a warm-up period
///
/// Leading `None`s are skipped; the EMA is seeded from the first `period`
/// defined values. Used for the MACD signal line.
pub fn calculate_ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return series;
    };

    let defined: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
    for (offset, ema) in calculate_ema_series(&defined, period).into_iter().enumerate() {
        series[start + offset] = ema;
    }

    series
}
