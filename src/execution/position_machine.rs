use crate::models::{PositionState, Side, Signal};

/// Two-state FLAT/LONG position tracker for a single symbol
///
/// State only moves on a confirmed fill. A BUY while LONG or a SELL while
/// FLAT is ignored rather than treated as an error.
#[derive(Debug, Clone, Default)]
pub struct PositionMachine {
    state: PositionState,
}

impl PositionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Order side the signal asks for from the current state, if any
    pub fn required_action(&self, signal: Signal) -> Option<Side> {
        match (self.state, signal) {
            (PositionState::Flat, Signal::Buy) => Some(Side::Buy),
            (PositionState::Long, Signal::Sell) => Some(Side::Sell),
            (_, Signal::Hold)
            | (PositionState::Long, Signal::Buy)
            | (PositionState::Flat, Signal::Sell) => None,
        }
    }

    /// Commit a confirmed fill
    ///
    /// Returns the new state when the fill moved the position, `None` when
    /// the fill does not match the current state.
    pub fn apply_fill(&mut self, side: Side) -> Option<PositionState> {
        let next = match (self.state, side) {
            (PositionState::Flat, Side::Buy) => PositionState::Long,
            (PositionState::Long, Side::Sell) => PositionState::Flat,
            (state, side) => {
                tracing::warn!("Ignoring {} fill while {}", side, state);
                return None;
            }
        };

        tracing::info!("Position {} -> {}", self.state, next);
        self.state = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_flat() {
        assert_eq!(PositionMachine::new().state(), PositionState::Flat);
    }

    #[test]
    fn test_required_action_is_gated_by_state() {
        let mut machine = PositionMachine::new();
        assert_eq!(machine.required_action(Signal::Buy), Some(Side::Buy));
        assert_eq!(machine.required_action(Signal::Sell), None);
        assert_eq!(machine.required_action(Signal::Hold), None);

        machine.apply_fill(Side::Buy);
        assert_eq!(machine.required_action(Signal::Buy), None);
        assert_eq!(machine.required_action(Signal::Sell), Some(Side::Sell));
        assert_eq!(machine.required_action(Signal::Hold), None);
    }

    #[test]
    fn test_full_cycle() {
        let mut machine = PositionMachine::new();

        assert_eq!(machine.apply_fill(Side::Buy), Some(PositionState::Long));
        assert_eq!(machine.apply_fill(Side::Sell), Some(PositionState::Flat));
        assert_eq!(machine.state(), PositionState::Flat);
    }

    #[test]
    fn test_mismatched_fills_are_ignored() {
        let mut machine = PositionMachine::new();
        assert_eq!(machine.apply_fill(Side::Sell), None);
        assert_eq!(machine.state(), PositionState::Flat);

        machine.apply_fill(Side::Buy);
        assert_eq!(machine.apply_fill(Side::Buy), None);
        assert_eq!(machine.state(), PositionState::Long);
    }
}
