use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::error::SourceError;
use crate::indicators::IndicatorSnapshot;
use crate::models::{Candle, PositionState, Signal};

/// Configuration for signal generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// Validate that candles are strictly ascending by timestamp
///
/// # Returns
/// * `Ok(())` if every candle is newer than the one before it
/// * `Err(SourceError::Unordered)` naming the first offending index otherwise
pub fn validate_candle_order(candles: &[Candle]) -> Result<(), SourceError> {
    match candles
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        Some(i) => Err(SourceError::Unordered { index: i + 1 }),
        None => Ok(()),
    }
}

/// Mean reversion entries/exits layered over a moving-average crossover
///
/// Rules, first match wins:
/// 1. FLAT, RSI oversold and close below the lower Bollinger band: BUY
/// 2. LONG, RSI overbought and close above the upper Bollinger band: SELL
/// 3. FLAT and short MA above long MA: BUY
/// 4. LONG and short MA below long MA: SELL
///
/// Anything else, including a snapshot still warming up, is HOLD.
#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    config: SignalConfig,
}

/// The subset of a snapshot the rules read, all defined
struct RuleInputs {
    close: f64,
    rsi: f64,
    bb_upper: f64,
    bb_lower: f64,
    sma_short: f64,
    sma_long: f64,
}

impl RuleInputs {
    fn from_snapshot(snapshot: &IndicatorSnapshot) -> Option<Self> {
        Some(Self {
            close: snapshot.close,
            rsi: snapshot.rsi?,
            bb_upper: snapshot.bb_upper?,
            bb_lower: snapshot.bb_lower?,
            sma_short: snapshot.sma_short?,
            sma_long: snapshot.sma_long?,
        })
    }
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Strategy for SignalGenerator {
    fn decide(&self, snapshot: &IndicatorSnapshot, position: PositionState) -> Signal {
        let Some(inputs) = RuleInputs::from_snapshot(snapshot) else {
            tracing::debug!("HOLD: indicators still warming up at {}", snapshot.timestamp);
            return Signal::Hold;
        };

        tracing::debug!(
            "Indicators: RSI={:.1}, Short MA={:.4}, Long MA={:.4}, BB=[{:.4}, {:.4}], Price={:.4}",
            inputs.rsi,
            inputs.sma_short,
            inputs.sma_long,
            inputs.bb_lower,
            inputs.bb_upper,
            inputs.close
        );

        let oversold = inputs.rsi < self.config.rsi_oversold && inputs.close < inputs.bb_lower;
        let overbought = inputs.rsi > self.config.rsi_overbought && inputs.close > inputs.bb_upper;

        match position {
            PositionState::Flat if oversold => {
                tracing::info!(
                    "BUY (mean reversion): RSI {:.1} < {}, close {:.4} < lower band {:.4}",
                    inputs.rsi,
                    self.config.rsi_oversold,
                    inputs.close,
                    inputs.bb_lower
                );
                Signal::Buy
            }
            PositionState::Long if overbought => {
                tracing::info!(
                    "SELL (mean reversion): RSI {:.1} > {}, close {:.4} > upper band {:.4}",
                    inputs.rsi,
                    self.config.rsi_overbought,
                    inputs.close,
                    inputs.bb_upper
                );
                Signal::Sell
            }
            PositionState::Flat if inputs.sma_short > inputs.sma_long => {
                tracing::info!(
                    "BUY (crossover): short MA {:.4} > long MA {:.4}",
                    inputs.sma_short,
                    inputs.sma_long
                );
                Signal::Buy
            }
            PositionState::Long if inputs.sma_short < inputs.sma_long => {
                tracing::info!(
                    "SELL (crossover): short MA {:.4} < long MA {:.4}",
                    inputs.sma_short,
                    inputs.sma_long
                );
                Signal::Sell
            }
            _ => Signal::Hold,
        }
    }

    fn name(&self) -> &str {
        "Mean Reversion + MA Crossover"
    }
}
