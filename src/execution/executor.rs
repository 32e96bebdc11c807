use crate::execution::PositionMachine;
use crate::models::{PositionState, Side, Signal};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Execute { side: Side, quantity: f64 },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// Turns a signal into an order request against the current position
pub struct Executor {
    quantity: f64,
}

impl Executor {
    /// `quantity` is the fixed base-asset amount traded on every entry and exit
    pub fn new(quantity: f64) -> Self {
        Self { quantity }
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Process a signal and decide what to do
    pub fn process_signal(&self, signal: Signal, position: &PositionMachine) -> ExecutionDecision {
        if let Some(side) = position.required_action(signal) {
            return ExecutionDecision {
                action: ExecutionAction::Execute {
                    side,
                    quantity: self.quantity,
                },
                reason: format!("{:?} signal while {}", signal, position.state()),
            };
        }

        let reason = match (signal, position.state()) {
            (Signal::Hold, _) => "Hold signal".to_string(),
            (Signal::Buy, PositionState::Long) => "Already have open position".to_string(),
            (Signal::Sell, PositionState::Flat) => "No position to sell".to_string(),
            (signal, state) => format!("{:?} signal not actionable while {}", signal, state),
        };

        ExecutionDecision {
            action: ExecutionAction::Skip,
            reason,
        }
    }
}
