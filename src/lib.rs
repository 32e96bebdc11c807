// Core modules
pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod strategy;

// Re-export commonly used types
pub use api::{CandleSource, OrderSink};
pub use bot::{Bot, BotController, BotStatus, TickOutcome};
pub use config::BotConfig;
pub use error::{LifecycleError, OrderError, SourceError};
pub use models::*;
pub use strategy::Strategy;
