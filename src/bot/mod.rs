// One trading bot: candle fetch -> indicators -> signal -> order -> position
pub mod controller;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::{CandleSource, OrderSink};
use crate::config::BotConfig;
use crate::error::{OrderError, SourceError};
use crate::execution::{ExecutionAction, Executor, PositionMachine};
use crate::indicators;
use crate::models::{OrderConfirmation, PositionState, Side, Signal};
use crate::strategy::{validate_candle_order, SignalGenerator, Strategy};

pub use controller::{BotController, BotStatus};

/// What a single tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// An order was confirmed and the position moved
    Traded {
        side: Side,
        confirmation: OrderConfirmation,
        position: PositionState,
    },
    /// Decision made, nothing to send
    NoAction { signal: Signal, reason: String },
    /// Not enough history to decide yet
    Skipped { reason: String },
    /// Candle source failed or returned unusable data
    DataError(SourceError),
    /// Order sink failed; position unchanged
    OrderError(OrderError),
}

impl TickOutcome {
    pub fn log(&self) {
        match self {
            TickOutcome::Traded {
                side,
                confirmation,
                position,
            } => tracing::info!(
                order_id = %confirmation.order_id,
                "✅ {} {} {} filled, position now {}",
                side,
                confirmation.quantity,
                confirmation.symbol,
                position
            ),
            TickOutcome::NoAction { signal, reason } => {
                tracing::info!("    → {:?}: {}", signal, reason)
            }
            TickOutcome::Skipped { reason } => tracing::info!("    → {}", reason),
            TickOutcome::DataError(e) => {
                tracing::warn!("  ✗ Skipping tick, candle data unavailable: {}", e)
            }
            TickOutcome::OrderError(e) => {
                tracing::warn!("  ✗ Order failed, position unchanged: {}", e)
            }
        }
    }
}

/// Runs ticks for one symbol against a candle source and an order sink
pub struct Bot<S, O> {
    config: BotConfig,
    source: S,
    sink: O,
    strategy: Box<dyn Strategy>,
    executor: Executor,
}

impl<S: CandleSource, O: OrderSink> Bot<S, O> {
    pub fn new(config: BotConfig, source: S, sink: O) -> Self {
        let strategy = Box::new(SignalGenerator::new(config.signals.clone()));
        let executor = Executor::new(config.trade_quantity);
        Self {
            config,
            source,
            sink,
            strategy,
            executor,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    /// Run one decision cycle
    ///
    /// Never panics on data or order failures; those come back as
    /// `DataError`/`OrderError` with the position untouched.
    pub async fn tick(&self, position: &Mutex<PositionMachine>) -> TickOutcome {
        let config = &self.config;

        let candles = match self
            .source
            .fetch(&config.symbol, config.interval, config.candle_limit)
            .await
        {
            Ok(candles) => candles,
            Err(e) => return TickOutcome::DataError(e),
        };

        if candles.is_empty() {
            return TickOutcome::DataError(SourceError::Empty {
                symbol: config.symbol.clone(),
            });
        }
        if let Err(e) = validate_candle_order(&candles) {
            return TickOutcome::DataError(e);
        }

        let needed = config.min_candles_required();
        if candles.len() < needed {
            return TickOutcome::Skipped {
                reason: format!("Collecting data... ({}/{} needed)", candles.len(), needed),
            };
        }

        let snapshots = indicators::compute(&candles, &config.indicators);
        let Some(latest) = snapshots.last() else {
            return TickOutcome::Skipped {
                reason: "No indicator snapshot".to_string(),
            };
        };

        let current = lock(position).state();
        tracing::info!(
            "  {} @ {:.4} ({} candles, {})",
            config.symbol,
            latest.close,
            candles.len(),
            current
        );

        let signal = self.strategy.decide(latest, current);
        let decision = {
            let machine = lock(position);
            self.executor.process_signal(signal, &machine)
        };

        let (side, quantity) = match decision.action {
            ExecutionAction::Execute { side, quantity } => (side, quantity),
            ExecutionAction::Skip => {
                return TickOutcome::NoAction {
                    signal,
                    reason: decision.reason,
                }
            }
        };

        tracing::info!("Placing {} order: {}", side, decision.reason);
        match self.sink.submit(&config.symbol, side, quantity).await {
            Ok(confirmation) => {
                let mut machine = lock(position);
                machine.apply_fill(side);
                TickOutcome::Traded {
                    side,
                    confirmation,
                    position: machine.state(),
                }
            }
            Err(e) => TickOutcome::OrderError(e),
        }
    }
}

fn lock(position: &Mutex<PositionMachine>) -> MutexGuard<'_, PositionMachine> {
    position.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PaperOrderSink;
    use crate::models::{Candle, KlineInterval};
    use chrono::{Duration, TimeZone, Utc};

    /// Serves a fixed candle window on every fetch
    struct FixedSource(Vec<Candle>);

    impl CandleSource for FixedSource {
        async fn fetch(
            &self,
            _symbol: &str,
            _interval: KlineInterval,
            limit: usize,
        ) -> Result<Vec<Candle>, SourceError> {
            let start = self.0.len().saturating_sub(limit);
            Ok(self.0[start..].to_vec())
        }
    }

    struct FailingSource;

    impl CandleSource for FailingSource {
        async fn fetch(
            &self,
            symbol: &str,
            _interval: KlineInterval,
            _limit: usize,
        ) -> Result<Vec<Candle>, SourceError> {
            Err(SourceError::Other(format!("{} feed down", symbol)))
        }
    }

    struct RejectingSink;

    impl OrderSink for RejectingSink {
        async fn submit(
            &self,
            _symbol: &str,
            _side: Side,
            _quantity: f64,
        ) -> Result<OrderConfirmation, OrderError> {
            Err(OrderError::Rejected("insufficient balance".to_string()))
        }
    }

    fn candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 10.0,
            })
            .collect()
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[tokio::test]
    async fn test_rising_market_buys_when_flat() {
        let bot = Bot::new(
            BotConfig::default(),
            FixedSource(candles(&rising(30))),
            PaperOrderSink::new(),
        );
        let position = Mutex::new(PositionMachine::new());

        let outcome = bot.tick(&position).await;

        assert!(matches!(
            outcome,
            TickOutcome::Traded {
                side: Side::Buy,
                position: PositionState::Long,
                ..
            }
        ));
        assert_eq!(lock(&position).state(), PositionState::Long);
        assert_eq!(bot.sink().fills().len(), 1);
    }

    #[tokio::test]
    async fn test_already_long_takes_no_action() {
        let bot = Bot::new(
            BotConfig::default(),
            FixedSource(candles(&rising(30))),
            PaperOrderSink::new(),
        );
        let position = Mutex::new(PositionMachine::new());
        lock(&position).apply_fill(Side::Buy);

        let outcome = bot.tick(&position).await;

        assert!(matches!(outcome, TickOutcome::NoAction { signal: Signal::Hold, .. }));
        assert!(bot.sink().fills().is_empty());
    }

    #[tokio::test]
    async fn test_short_history_is_skipped() {
        let bot = Bot::new(
            BotConfig::default(),
            FixedSource(candles(&rising(10))),
            PaperOrderSink::new(),
        );
        let position = Mutex::new(PositionMachine::new());

        let outcome = bot.tick(&position).await;

        match outcome {
            TickOutcome::Skipped { reason } => assert!(reason.contains("10/20")),
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_source_failure_is_a_data_error() {
        let bot = Bot::new(BotConfig::default(), FailingSource, PaperOrderSink::new());
        let position = Mutex::new(PositionMachine::new());

        let outcome = bot.tick(&position).await;

        assert!(matches!(outcome, TickOutcome::DataError(SourceError::Other(_))));
        assert_eq!(lock(&position).state(), PositionState::Flat);
    }

    #[tokio::test]
    async fn test_unordered_candles_are_a_data_error() {
        let mut data = candles(&rising(30));
        data.swap(10, 11);
        let bot = Bot::new(BotConfig::default(), FixedSource(data), PaperOrderSink::new());
        let position = Mutex::new(PositionMachine::new());

        let outcome = bot.tick(&position).await;

        assert!(matches!(
            outcome,
            TickOutcome::DataError(SourceError::Unordered { index: 11 })
        ));
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_position() {
        let bot = Bot::new(
            BotConfig::default(),
            FixedSource(candles(&rising(30))),
            RejectingSink,
        );
        let position = Mutex::new(PositionMachine::new());

        for _ in 0..3 {
            let outcome = bot.tick(&position).await;
            assert!(matches!(outcome, TickOutcome::OrderError(OrderError::Rejected(_))));
        }
        assert_eq!(lock(&position).state(), PositionState::Flat);
    }

    #[tokio::test]
    async fn test_custom_strategy_is_used() {
        struct AlwaysSell;
        impl Strategy for AlwaysSell {
            fn decide(&self, _: &indicators::IndicatorSnapshot, _: PositionState) -> Signal {
                Signal::Sell
            }
            fn name(&self) -> &str {
                "always sell"
            }
        }

        let bot = Bot::new(
            BotConfig::default(),
            FixedSource(candles(&rising(30))),
            PaperOrderSink::new(),
        )
        .with_strategy(Box::new(AlwaysSell));
        let position = Mutex::new(PositionMachine::new());
        assert_eq!(bot.strategy_name(), "always sell");

        let outcome = bot.tick(&position).await;

        match outcome {
            TickOutcome::NoAction { signal, reason } => {
                assert_eq!(signal, Signal::Sell);
                assert!(reason.contains("No position"));
            }
            other => panic!("expected no action, got {:?}", other),
        }
    }
}
