use super::moving_average::{calculate_ema_of_series, calculate_ema_series};

/// MACD line, signal line and histogram, each aligned with the input prices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Moving Average Convergence Divergence
///
/// `macd = EMA(fast) - EMA(slow)`, `signal = EMA(macd, signal_period)`.
/// The MACD line is defined once the slow EMA is; the signal line needs
/// a further `signal_period - 1` MACD values.
pub fn calculate_macd_series(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let fast_ema = calculate_ema_series(prices, fast);
    let slow_ema = calculate_ema_series(prices, slow);

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = calculate_ema_of_series(&macd, signal_period);

    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}
