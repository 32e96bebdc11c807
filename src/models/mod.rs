use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candlestick data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Order side sent to the order sink
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the bot currently holds the asset
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => f.write_str("FLAT"),
            PositionState::Long => f.write_str("LONG"),
        }
    }
}

/// Acknowledgement returned by an order sink for an executed market order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    /// Fill price when the sink reports one
    pub price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Kline (candle) interval supported by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "8h")]
    EightHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl KlineInterval {
    pub const ALL: [KlineInterval; 15] = [
        KlineInterval::OneMinute,
        KlineInterval::ThreeMinutes,
        KlineInterval::FiveMinutes,
        KlineInterval::FifteenMinutes,
        KlineInterval::ThirtyMinutes,
        KlineInterval::OneHour,
        KlineInterval::TwoHours,
        KlineInterval::FourHours,
        KlineInterval::SixHours,
        KlineInterval::EightHours,
        KlineInterval::TwelveHours,
        KlineInterval::OneDay,
        KlineInterval::ThreeDays,
        KlineInterval::OneWeek,
        KlineInterval::OneMonth,
    ];

    /// Exchange query-string form, e.g. "15m"
    pub fn as_str(&self) -> &'static str {
        match self {
            KlineInterval::OneMinute => "1m",
            KlineInterval::ThreeMinutes => "3m",
            KlineInterval::FiveMinutes => "5m",
            KlineInterval::FifteenMinutes => "15m",
            KlineInterval::ThirtyMinutes => "30m",
            KlineInterval::OneHour => "1h",
            KlineInterval::TwoHours => "2h",
            KlineInterval::FourHours => "4h",
            KlineInterval::SixHours => "6h",
            KlineInterval::EightHours => "8h",
            KlineInterval::TwelveHours => "12h",
            KlineInterval::OneDay => "1d",
            KlineInterval::ThreeDays => "3d",
            KlineInterval::OneWeek => "1w",
            KlineInterval::OneMonth => "1M",
        }
    }

    /// Nominal candle length in seconds (a month counts as 30 days)
    pub fn as_secs(&self) -> i64 {
        const MINUTE: i64 = 60;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match self {
            KlineInterval::OneMinute => MINUTE,
            KlineInterval::ThreeMinutes => 3 * MINUTE,
            KlineInterval::FiveMinutes => 5 * MINUTE,
            KlineInterval::FifteenMinutes => 15 * MINUTE,
            KlineInterval::ThirtyMinutes => 30 * MINUTE,
            KlineInterval::OneHour => HOUR,
            KlineInterval::TwoHours => 2 * HOUR,
            KlineInterval::FourHours => 4 * HOUR,
            KlineInterval::SixHours => 6 * HOUR,
            KlineInterval::EightHours => 8 * HOUR,
            KlineInterval::TwelveHours => 12 * HOUR,
            KlineInterval::OneDay => DAY,
            KlineInterval::ThreeDays => 3 * DAY,
            KlineInterval::OneWeek => 7 * DAY,
            KlineInterval::OneMonth => 30 * DAY,
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlineInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KlineInterval::ALL
            .iter()
            .copied()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| format!("unknown kline interval: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_round_trips_through_str() {
        for interval in KlineInterval::ALL {
            assert_eq!(interval.as_str().parse::<KlineInterval>(), Ok(interval));
        }
    }

    #[test]
    fn test_month_and_minute_are_distinct() {
        assert_eq!("1M".parse::<KlineInterval>(), Ok(KlineInterval::OneMonth));
        assert_eq!("1m".parse::<KlineInterval>(), Ok(KlineInterval::OneMinute));
        assert!("2m".parse::<KlineInterval>().is_err());
    }

    #[test]
    fn test_interval_deserializes_from_exchange_string() {
        let interval: KlineInterval = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(interval, KlineInterval::FifteenMinutes);
        assert_eq!(interval.as_secs(), 900);
    }

    #[test]
    fn test_side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }

    #[test]
    fn test_position_defaults_to_flat() {
        assert_eq!(PositionState::default(), PositionState::Flat);
    }
}
