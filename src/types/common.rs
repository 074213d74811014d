//! Common domain types for Binance streams.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market a stream is served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Spot (and margin) market streams
    #[default]
    Spot,
    /// USD-M futures market streams
    Futures,
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Market::Spot => write!(f, "spot"),
            Market::Futures => write!(f, "futures"),
        }
    }
}

/// Account a user data stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStreamKind {
    /// Spot account
    Spot,
    /// Cross margin account
    Margin,
    /// USD-M futures account
    Futures,
}

impl UserStreamKind {
    /// Market whose WebSocket endpoint serves this user stream.
    pub fn market(self) -> Market {
        match self {
            UserStreamKind::Spot | UserStreamKind::Margin => Market::Spot,
            UserStreamKind::Futures => Market::Futures,
        }
    }
}

impl std::fmt::Display for UserStreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStreamKind::Spot => write!(f, "spot"),
            UserStreamKind::Margin => write!(f, "margin"),
            UserStreamKind::Futures => write!(f, "futures"),
        }
    }
}

/// Candlestick interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    #[serde(rename = "1s")]
    OneSecond,
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
    /// Wire representation used in stream names.
    pub fn as_str(self) -> &'static str {
        match self {
            KlineInterval::OneSecond => "1s",
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
}

impl std::fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol plus book depth, the target of a partial book depth stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthTarget {
    /// Trading pair, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Number of levels per side (5, 10 or 20).
    pub level: u16,
}

impl DepthTarget {
    /// Create a new depth target.
    pub fn new(symbol: impl Into<String>, level: u16) -> Self {
        Self {
            symbol: symbol.into(),
            level,
        }
    }
}

/// One price level of an order book side.
///
/// Deserializes from the wire tuple `["price", "quantity"]` and serializes
/// as `{"price": ..., "quantity": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Decimal, Decimal)")]
pub struct PriceLevel {
    /// Price of the level.
    pub price: Decimal,
    /// Quantity resting at the price.
    pub quantity: Decimal,
}

impl From<(Decimal, Decimal)> for PriceLevel {
    fn from((price, quantity): (Decimal, Decimal)) -> Self {
        Self { price, quantity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_interval_wire_names() {
        assert_eq!(KlineInterval::OneMinute.to_string(), "1m");
        assert_eq!(KlineInterval::OneMonth.to_string(), "1M");
        let json = serde_json::to_string(&KlineInterval::FifteenMinutes).unwrap();
        assert_eq!(json, r#""15m""#);
    }

    #[test]
    fn test_user_stream_market() {
        assert_eq!(UserStreamKind::Margin.market(), Market::Spot);
        assert_eq!(UserStreamKind::Futures.market(), Market::Futures);
    }

    #[test]
    fn test_price_levels_keep_wire_order() {
        let levels: Vec<PriceLevel> =
            serde_json::from_str(r#"[["0.3","1"],["0.1","2"],["0.2","3"]]"#).unwrap();
        let prices: Vec<_> = levels.iter().map(|l| l.price.to_string()).collect();
        assert_eq!(prices, ["0.3", "0.1", "0.2"]);
        assert_eq!(levels[1].quantity, Decimal::from_str("2").unwrap());

        let empty: Vec<PriceLevel> = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_price_level_serializes_as_record() {
        let level = PriceLevel::from((Decimal::new(15, 1), Decimal::new(2, 0)));
        let json = serde_json::to_value(level).unwrap();
        assert_eq!(json, serde_json::json!({ "price": "1.5", "quantity": "2" }));
    }
}
