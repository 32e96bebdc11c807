use serde::Serialize;

/// One point of the Bollinger envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

/// Bollinger Bands over the trailing `period` closes
///
/// `mid` is the SMA, the bands sit `k` population standard deviations away.
pub fn calculate_bollinger(prices: &[f64], period: usize, k: f64) -> Option<BollingerBands> {
    let mid = super::calculate_sma(prices, period)?;
    let window = &prices[prices.len() - period..];

    let variance = window.iter().map(|p| (p - mid).powi(2)).sum::<f64>() / period as f64;
    let deviation = k * variance.sqrt();

    Some(BollingerBands {
        upper: mid + deviation,
        mid,
        lower: mid - deviation,
    })
}

/// Bollinger Bands for every prefix of `prices`
pub fn calculate_bollinger_series(
    prices: &[f64],
    period: usize,
    k: f64,
) -> Vec<Option<BollingerBands>> {
    (0..prices.len())
        .map(|i| calculate_bollinger(&prices[..=i], period, k))
        .collect()
}
