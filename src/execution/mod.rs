// Order execution: signal -> order request -> position transition
pub mod executor;
pub mod position_machine;

pub use executor::{ExecutionAction, ExecutionDecision, Executor};
pub use position_machine::PositionMachine;
