use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Bot;
use crate::api::{CandleSource, OrderSink};
use crate::error::LifecycleError;
use crate::execution::PositionMachine;
use crate::models::PositionState;

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotStatus {
    pub running: bool,
    pub symbol: String,
    /// `None` when no session is active
    pub position: Option<PositionState>,
    /// Ticks completed by the current session
    pub ticks: u64,
}

/// State shared between the controller and its worker
struct SessionState {
    position: Mutex<PositionMachine>,
    ticks: AtomicU64,
}

struct BotSession {
    state: Arc<SessionState>,
    shutdown: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl BotSession {
    fn is_live(&self) -> bool {
        !*self.shutdown.borrow() && !self.worker.is_finished()
    }
}

/// Starts, stops and reports on one bot's background worker
///
/// At most one worker exists at a time. `start` and `stop` are serialized
/// through the session lock, so a concurrent pair can never double-spawn
/// or double-join.
pub struct BotController<S, O> {
    bot: Arc<Bot<S, O>>,
    session: tokio::sync::Mutex<Option<BotSession>>,
}

impl<S: CandleSource, O: OrderSink> BotController<S, O> {
    pub fn new(bot: Bot<S, O>) -> Self {
        Self {
            bot: Arc::new(bot),
            session: tokio::sync::Mutex::new(None),
        }
    }

    pub fn bot(&self) -> &Bot<S, O> {
        &self.bot
    }

    /// Spawn the worker with a fresh FLAT position
    pub async fn start(&self) -> Result<(), LifecycleError> {
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(BotSession::is_live) {
            tracing::warn!("Start rejected: bot already running");
            return Err(LifecycleError::AlreadyRunning);
        }

        let state = Arc::new(SessionState {
            position: Mutex::new(PositionMachine::new()),
            ticks: AtomicU64::new(0),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(run_worker(self.bot.clone(), state.clone(), shutdown_rx));

        tracing::info!(
            symbol = %self.bot.config().symbol,
            interval = %self.bot.config().interval,
            strategy = self.bot.strategy_name(),
            "🚀 Bot started"
        );
        *session = Some(BotSession {
            state,
            shutdown,
            worker,
        });
        Ok(())
    }

    /// Signal the worker and wait for it to exit
    ///
    /// Returns once the in-flight tick, if any, has finished.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let mut session = self.session.lock().await;
        let Some(active) = session.take() else {
            tracing::warn!("Stop rejected: bot not running");
            return Err(LifecycleError::NotRunning);
        };

        active.shutdown.send_replace(true);
        if let Err(e) = active.worker.await {
            tracing::error!("Worker ended abnormally: {}", e);
        }

        let ticks = active.state.ticks.load(Ordering::SeqCst);
        tracing::info!(ticks, "🛑 Bot stopped");
        Ok(())
    }

    pub async fn status(&self) -> BotStatus {
        let session = self.session.lock().await;
        let symbol = self.bot.config().symbol.clone();

        match session.as_ref() {
            Some(active) => BotStatus {
                running: active.is_live(),
                symbol,
                position: Some(
                    active
                        .state
                        .position
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .state(),
                ),
                ticks: active.state.ticks.load(Ordering::SeqCst),
            },
            None => BotStatus {
                running: false,
                symbol,
                position: None,
                ticks: 0,
            },
        }
    }
}

async fn run_worker<S: CandleSource, O: OrderSink>(
    bot: Arc<Bot<S, O>>,
    state: Arc<SessionState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = bot.config().tick_interval();

    loop {
        let stopping = *shutdown.borrow();
        if stopping {
            break;
        }

        let tick_number = state.ticks.load(Ordering::SeqCst) + 1;
        tracing::info!("⏱️  Tick #{}", tick_number);

        // Own task per tick so a panic is contained to that tick
        let tick = tokio::spawn({
            let bot = bot.clone();
            let state = state.clone();
            async move { bot.tick(&state.position).await }
        });
        match tick.await {
            Ok(outcome) => outcome.log(),
            Err(e) => tracing::error!("  ✗ Tick #{} failed, skipping: {}", tick_number, e),
        }
        state.ticks.fetch_add(1, Ordering::SeqCst);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                // Controller dropped without stop()
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MarketScenario, PaperOrderSink, SyntheticCandleSource};
    use crate::config::BotConfig;
    use crate::models::KlineInterval;
    use std::time::Duration;

    fn controller() -> BotController<SyntheticCandleSource, PaperOrderSink> {
        let source = SyntheticCandleSource::new(42, MarketScenario::Uptrend)
            .with_history(40, KlineInterval::OneMinute);
        BotController::new(Bot::new(BotConfig::default(), source, PaperOrderSink::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_before_start() {
        let controller = controller();

        let status = controller.status().await;
        assert!(!status.running);
        assert_eq!(status.position, None);
        assert_eq!(status.symbol, "BTCUSDT");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_the_interval() {
        let controller = controller();
        controller.start().await.unwrap();

        // First tick runs immediately, then one per 60s
        tokio::time::sleep(Duration::from_secs(150)).await;
        let status = controller.status().await;
        assert!(status.running);
        assert_eq!(status.ticks, 3);

        controller.stop().await.unwrap();
        assert_eq!(controller.bot().source().len(), 43);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_sleep() {
        let controller = controller();
        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let before = tokio::time::Instant::now();
        controller.stop().await.unwrap();
        assert!(before.elapsed() < Duration::from_secs(60));

        let status = controller.status().await;
        assert!(!status.running);
        assert_eq!(status.ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_position() {
        let controller = controller();
        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.stop().await.unwrap();

        controller.start().await.unwrap();
        let status = controller.status().await;
        assert_eq!(status.position, Some(PositionState::Flat));
        controller.stop().await.unwrap();
    }
}
