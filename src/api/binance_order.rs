//! Signed market orders against the Binance spot API.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tokio::time::Duration;

use super::binance::http_client;
use super::OrderSink;
use crate::error::OrderError;
use crate::models::{OrderConfirmation, Side};

type HmacSha256 = Hmac<Sha256>;

const ORDER_PATH: &str = "/api/v3/order";
const RECV_WINDOW_MS: u64 = 5000;

/// Reply to `POST /api/v3/order` with `newOrderRespType=RESULT`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrderResponse {
    symbol: String,
    order_id: u64,
    transact_time: i64,
    executed_qty: String,
    cummulative_quote_qty: String,
    status: String,
}

/// Live order sink: submits MARKET orders with an HMAC-SHA256 signed query
pub struct BinanceOrderSink {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl BinanceOrderSink {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OrderError> {
        let client = http_client(timeout).map_err(|e| OrderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        })
    }

    /// Hex-encoded HMAC-SHA256 of `message` under the API secret
    fn sign(&self, message: &str) -> Result<String, OrderError> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| OrderError::Rejected(format!("unusable api secret: {}", e)))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Order parameters in a fixed order, then `timestamp`, then `signature`
    fn signed_query(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        timestamp_ms: i64,
    ) -> Result<String, OrderError> {
        let query = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newOrderRespType=RESULT&recvWindow={}&timestamp={}",
            symbol, side, quantity, RECV_WINDOW_MS, timestamp_ms
        );
        let signature = self.sign(&query)?;
        Ok(format!("{}&signature={}", query, signature))
    }
}

impl OrderSink for BinanceOrderSink {
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

        let query = self.signed_query(symbol, side, quantity, Utc::now().timestamp_millis())?;
        let url = format!("{}{}?{}", self.base_url, ORDER_PATH, query);

        tracing::info!(symbol, side = %side, quantity, "Placing market order");

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| OrderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP {}: {}", status.as_u16(), body);
            // 5xx: outcome unknown. 4xx: the exchange refused it
            return Err(if status.is_server_error() {
                OrderError::Transport(message)
            } else {
                OrderError::Rejected(message)
            });
        }

        let order: NewOrderResponse = response
            .json()
            .await
            .map_err(|e| OrderError::Transport(format!("unreadable order response: {}", e)))?;

        if matches!(order.status.as_str(), "REJECTED" | "EXPIRED") {
            return Err(OrderError::Rejected(format!(
                "order {} {}",
                order.order_id, order.status
            )));
        }

        let executed = order.executed_qty.parse::<f64>().unwrap_or(quantity);
        let quote = order.cummulative_quote_qty.parse::<f64>().ok();
        let price = quote.filter(|_| executed > 0.0).map(|q| q / executed);

        tracing::info!(
            order_id = order.order_id,
            status = %order.status,
            executed,
            "Order placed"
        );

        Ok(OrderConfirmation {
            order_id: order.order_id.to_string(),
            symbol: order.symbol,
            side,
            quantity: executed,
            price,
            timestamp: DateTime::from_timestamp_millis(order.transact_time).unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn sink(server: &mockito::Server) -> BinanceOrderSink {
        BinanceOrderSink::new(server.url(), "test-key", "test-secret", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        // Worked example from the exchange's signed-endpoint documentation
        let sink = BinanceOrderSink::new(
            "http://localhost",
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A",
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j",
            Duration::from_secs(5),
        )
        .unwrap();

        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sink.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_layout() {
        let sink = BinanceOrderSink::new("http://localhost", "k", "s", Duration::from_secs(5))
            .unwrap();

        let query = sink
            .signed_query("BTCUSDT", Side::Sell, 0.001, 1_700_000_000_000)
            .unwrap();

        let (unsigned, signature) = query.split_once("&signature=").unwrap();
        assert_eq!(
            unsigned,
            "symbol=BTCUSDT&side=SELL&type=MARKET&quantity=0.001&newOrderRespType=RESULT&recvWindow=5000&timestamp=1700000000000"
        );
        assert_eq!(signature, sink.sign(unsigned).unwrap());
        assert_eq!(signature.len(), 64);
    }

    #[tokio::test]
    async fn test_submit_sends_signed_market_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ORDER_PATH)
            .match_header("X-MBX-APIKEY", "test-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
                Matcher::UrlEncoded("side".into(), "BUY".into()),
                Matcher::UrlEncoded("type".into(), "MARKET".into()),
                Matcher::UrlEncoded("quantity".into(), "0.001".into()),
                Matcher::Regex("timestamp=[0-9]+".into()),
                Matcher::Regex("signature=[0-9a-f]{64}".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"symbol":"BTCUSDT","orderId":28,"clientOrderId":"abc","transactTime":1700000000000,
                   "price":"0.00000000","origQty":"0.00100000","executedQty":"0.00100000",
                   "cummulativeQuoteQty":"35.00000000","status":"FILLED","timeInForce":"GTC",
                   "type":"MARKET","side":"BUY"}"#,
            )
            .create_async()
            .await;

        let confirmation = sink(&server)
            .submit("BTCUSDT", Side::Buy, 0.001)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(confirmation.order_id, "28");
        assert_eq!(confirmation.side, Side::Buy);
        assert_eq!(confirmation.quantity, 0.001);
        assert!((confirmation.price.unwrap() - 35_000.0).abs() < 1e-6);
        assert_eq!(confirmation.timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_exchange_rejection_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", ORDER_PATH)
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code":-2010,"msg":"Account has insufficient balance for requested action."}"#)
            .create_async()
            .await;

        let result = sink(&server).submit("BTCUSDT", Side::Buy, 0.001).await;

        match result {
            Err(OrderError::Rejected(msg)) => assert!(msg.contains("insufficient balance")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_order_is_a_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", ORDER_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"symbol":"BTCUSDT","orderId":29,"transactTime":1700000000000,
                   "executedQty":"0.00000000","cummulativeQuoteQty":"0.00000000","status":"EXPIRED"}"#,
            )
            .create_async()
            .await;

        let result = sink(&server).submit("BTCUSDT", Side::Sell, 0.001).await;
        assert!(matches!(result, Err(OrderError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_a_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", ORDER_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = sink(&server).submit("BTCUSDT", Side::Buy, 0.001).await;
        assert!(matches!(result, Err(OrderError::Transport(_))));
    }

    #[tokio::test]
    async fn test_invalid_quantity_never_reaches_exchange() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ORDER_PATH)
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = sink(&server).submit("BTCUSDT", Side::Buy, -1.0).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(OrderError::Rejected(_))));
    }
}
