// Market data and order routing collaborators
pub mod binance;
pub mod binance_order;
pub mod paper;
pub mod synthetic;

use std::future::Future;
use std::sync::Arc;

use crate::error::{OrderError, SourceError};
use crate::models::{Candle, KlineInterval, OrderConfirmation, Side};

pub use binance::BinanceClient;
pub use binance_order::BinanceOrderSink;
pub use paper::PaperOrderSink;
pub use synthetic::{MarketScenario, SyntheticCandleSource};

/// Supplies candles for a symbol, oldest first, at most `limit` of them
pub trait CandleSource: Send + Sync + 'static {
    fn fetch(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candle>, SourceError>> + Send;
}

/// Executes market orders
pub trait OrderSink: Send + Sync + 'static {
    fn submit(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> impl Future<Output = Result<OrderConfirmation, OrderError>> + Send;
}

impl<T: CandleSource> CandleSource for Arc<T> {
    fn fetch(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candle>, SourceError>> + Send {
        (**self).fetch(symbol, interval, limit)
    }
}

impl<T: OrderSink> OrderSink for Arc<T> {
    fn submit(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> impl Future<Output = Result<OrderConfirmation, OrderError>> + Send {
        (**self).submit(symbol, side, quantity)
    }
}
