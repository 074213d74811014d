//! Stream names and subscription targets.

use std::fmt;

use crate::types::{DepthTarget, KlineInterval};

/// One subscribed market stream.
///
/// Renders the URL path appended to the market's WebSocket base and selects
/// how frames are normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Diff book depth, `<symbol>@depth`
    Depth { symbol: String },
    /// Partial book depth, `<symbol>@depth<level>`
    PartialDepth(DepthTarget),
    /// Candlesticks, `<symbol>@kline_<interval>`
    Candles {
        symbol: String,
        interval: KlineInterval,
    },
    /// Raw trades, `<symbol>@trade`
    Trades { symbol: String },
    /// Aggregate trades, `<symbol>@aggTrade`
    AggTrades { symbol: String },
    /// 24h ticker, `<symbol>@ticker`
    Ticker { symbol: String },
    /// Every symbol's 24h ticker, `!ticker@arr`
    AllTickers,
    /// Futures mark price, `<symbol>@markPrice@1s`
    MarkPrice { symbol: String },
    /// Every futures symbol's mark price, `!markPrice@arr@1s`
    AllMarkPrices,
    /// Best bid/ask, `<symbol>@bookTicker`
    BookTicker { symbol: String },
    /// Futures liquidation orders, `<symbol>@forceOrder`
    ForceOrder { symbol: String },
}

impl StreamKind {
    /// URL path of the stream, symbols lower-cased.
    pub fn path(&self) -> String {
        match self {
            StreamKind::Depth { symbol } => format!("{}@depth", symbol.to_lowercase()),
            StreamKind::PartialDepth(target) => {
                format!("{}@depth{}", target.symbol.to_lowercase(), target.level)
            }
            StreamKind::Candles { symbol, interval } => {
                format!("{}@kline_{}", symbol.to_lowercase(), interval)
            }
            StreamKind::Trades { symbol } => format!("{}@trade", symbol.to_lowercase()),
            StreamKind::AggTrades { symbol } => format!("{}@aggTrade", symbol.to_lowercase()),
            StreamKind::Ticker { symbol } => format!("{}@ticker", symbol.to_lowercase()),
            StreamKind::AllTickers => "!ticker@arr".to_string(),
            StreamKind::MarkPrice { symbol } => format!("{}@markPrice@1s", symbol.to_lowercase()),
            StreamKind::AllMarkPrices => "!markPrice@arr@1s".to_string(),
            StreamKind::BookTicker { symbol } => format!("{}@bookTicker", symbol.to_lowercase()),
            StreamKind::ForceOrder { symbol } => format!("{}@forceOrder", symbol.to_lowercase()),
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// One or many subscription targets.
///
/// Lets stream constructors accept a single symbol as well as a list:
///
/// ```
/// use binance_stream_client::ws::IntoTargets;
///
/// let one: Vec<String> = "BTCUSDT".into_targets();
/// let many: Vec<String> = ["BTCUSDT", "ETHUSDT"].into_targets();
/// assert_eq!(one, ["BTCUSDT"]);
/// assert_eq!(many.len(), 2);
/// ```
pub trait IntoTargets<T> {
    fn into_targets(self) -> Vec<T>;
}

impl IntoTargets<String> for &str {
    fn into_targets(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoTargets<String> for String {
    fn into_targets(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: Into<String>> IntoTargets<String> for Vec<S> {
    fn into_targets(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoTargets<String> for [S; N] {
    fn into_targets(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: AsRef<str>> IntoTargets<String> for &[S] {
    fn into_targets(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl IntoTargets<DepthTarget> for DepthTarget {
    fn into_targets(self) -> Vec<DepthTarget> {
        vec![self]
    }
}

impl IntoTargets<DepthTarget> for Vec<DepthTarget> {
    fn into_targets(self) -> Vec<DepthTarget> {
        self
    }
}

impl<const N: usize> IntoTargets<DepthTarget> for [DepthTarget; N] {
    fn into_targets(self) -> Vec<DepthTarget> {
        self.into()
    }
}
