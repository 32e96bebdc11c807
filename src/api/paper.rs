//! Paper-trading order sink: every valid market order fills immediately.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use super::OrderSink;
use crate::error::OrderError;
use crate::models::{OrderConfirmation, Side};

/// Simulated order sink that records every fill in memory
#[derive(Debug, Default)]
pub struct PaperOrderSink {
    fills: Mutex<Vec<OrderConfirmation>>,
}

impl PaperOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills so far, oldest first
    pub fn fills(&self) -> Vec<OrderConfirmation> {
        self.fills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OrderSink for PaperOrderSink {
    async fn submit(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> Result<OrderConfirmation, OrderError> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(OrderError::Rejected(format!(
                "invalid quantity {} for {}",
                quantity, symbol
            )));
        }

        let confirmation = OrderConfirmation {
            order_id: format!("paper-{}", Uuid::new_v4()),
            symbol: symbol.to_string(),
            side,
            quantity,
            price: None,
            timestamp: Utc::now(),
        };

        tracing::info!(
            order_id = %confirmation.order_id,
            symbol,
            side = %side,
            quantity,
            "Paper order filled"
        );

        self.fills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(confirmation.clone());

        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fills_are_recorded_in_order() {
        let sink = PaperOrderSink::new();

        sink.submit("BTCUSDT", Side::Buy, 0.001).await.unwrap();
        sink.submit("BTCUSDT", Side::Sell, 0.001).await.unwrap();

        let fills = sink.fills();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].side, Side::Buy);
        assert_eq!(fills[1].side, Side::Sell);
        assert_ne!(fills[0].order_id, fills[1].order_id);
        assert!(fills[0].order_id.starts_with("paper-"));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let sink = PaperOrderSink::new();

        let result = sink.submit("BTCUSDT", Side::Buy, 0.0).await;
        assert!(matches!(result, Err(OrderError::Rejected(_))));

        let result = sink.submit("BTCUSDT", Side::Buy, f64::NAN).await;
        assert!(matches!(result, Err(OrderError::Rejected(_))));
        assert!(sink.fills().is_empty());
    }
}
