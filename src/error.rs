use thiserror::Error;

/// Failures while pulling candles from a candle source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("exchange returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed kline payload: {0}")]
    Malformed(String),

    #[error("candles out of order at index {index}")]
    Unordered { index: usize },

    #[error("no candles returned for {symbol}")]
    Empty { symbol: String },

    #[error("{0}")]
    Other(String),
}

/// Failures while submitting an order to an order sink
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("order transport failed: {0}")]
    Transport(String),
}

/// Misuse of the start/stop control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("bot is already running")]
    AlreadyRunning,

    #[error("bot is not running")]
    NotRunning,
}

impl LifecycleError {
    /// Status code an HTTP control layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            LifecycleError::AlreadyRunning => 409,
            LifecycleError::NotRunning => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_status_codes() {
        assert_eq!(LifecycleError::AlreadyRunning.http_status(), 409);
        assert_eq!(LifecycleError::NotRunning.http_status(), 400);
    }

    #[test]
    fn test_source_error_messages() {
        let err = SourceError::Status {
            status: 429,
            body: "too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "exchange returned HTTP 429: too many requests");
        assert_eq!(
            SourceError::Unordered { index: 3 }.to_string(),
            "candles out of order at index 3"
        );
    }
}
