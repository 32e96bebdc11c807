/// Calculate Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Average gain and loss are plain means over the last `period` changes.
/// A window with no losses saturates at 100.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - (period + 1)..];

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum += change.abs();
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - (100.0 / (1.0 + rs));

    Some(rsi)
}

/// RSI for every prefix of `prices`; the first `period` entries are `None`
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| calculate_rsi(&prices[..=i], period))
        .collect()
}
