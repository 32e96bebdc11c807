// Trading strategy module
pub mod signals;

use crate::indicators::IndicatorSnapshot;
use crate::models::{PositionState, Signal};

pub use signals::{validate_candle_order, SignalConfig, SignalGenerator};

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Decide what to do given the latest indicator snapshot and current position
    fn decide(&self, snapshot: &IndicatorSnapshot, position: PositionState) -> Signal;

    /// Get strategy name
    fn name(&self) -> &str;
}
