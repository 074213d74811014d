//! Market data WebSocket messages.
//!
//! Each event deserializes from Binance's terse wire keys and serializes
//! with descriptive camelCase names. Optional wire fields that are absent
//! stay absent in the serialized form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{KlineInterval, PriceLevel};

/// Diff book depth update (`<symbol>@depth`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DepthEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    #[serde(rename(deserialize = "U"))]
    pub first_update_id: u64,
    #[serde(rename(deserialize = "u"))]
    pub final_update_id: u64,
    /// Bid levels in feed order.
    #[serde(rename(deserialize = "b"))]
    pub bid_depth: Vec<PriceLevel>,
    /// Ask levels in feed order.
    #[serde(rename(deserialize = "a"))]
    pub ask_depth: Vec<PriceLevel>,
}

/// Partial book depth snapshot (`<symbol>@depth<level>`).
///
/// The spot payload carries neither symbol nor level, so both are filled in
/// from the subscription target. Futures payloads use the short keys, which
/// are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDepthEvent {
    #[serde(skip_deserializing)]
    pub symbol: String,
    #[serde(skip_deserializing)]
    pub level: u16,
    #[serde(alias = "u")]
    pub last_update_id: u64,
    #[serde(alias = "b")]
    pub bids: Vec<PriceLevel>,
    #[serde(alias = "a")]
    pub asks: Vec<PriceLevel>,
}

/// Candlestick update (`<symbol>@kline_<interval>`), flattened out of the
/// nested `k` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), from = "RawCandleMessage")]
pub struct CandleEvent {
    pub event_type: String,
    pub event_time: u64,
    pub symbol: String,
    pub start_time: u64,
    pub close_time: u64,
    pub first_trade_id: i64,
    pub last_trade_id: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trades: u64,
    pub interval: KlineInterval,
    pub is_final: bool,
    pub quote_volume: Decimal,
    pub buy_volume: Decimal,
    pub quote_buy_volume: Decimal,
}

#[derive(Deserialize)]
struct RawCandleMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "E")]
    event_time: u64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    kline: RawKline,
}

#[derive(Deserialize)]
struct RawKline {
    #[serde(rename = "t")]
    start_time: u64,
    #[serde(rename = "T")]
    close_time: u64,
    #[serde(rename = "f")]
    first_trade_id: i64,
    #[serde(rename = "L")]
    last_trade_id: i64,
    #[serde(rename = "o")]
    open: Decimal,
    #[serde(rename = "h")]
    high: Decimal,
    #[serde(rename = "l")]
    low: Decimal,
    #[serde(rename = "c")]
    close: Decimal,
    #[serde(rename = "v")]
    volume: Decimal,
    #[serde(rename = "n")]
    trades: u64,
    #[serde(rename = "i")]
    interval: KlineInterval,
    #[serde(rename = "x")]
    is_final: bool,
    #[serde(rename = "q")]
    quote_volume: Decimal,
    #[serde(rename = "V")]
    buy_volume: Decimal,
    #[serde(rename = "Q")]
    quote_buy_volume: Decimal,
}

impl From<RawCandleMessage> for CandleEvent {
    fn from(raw: RawCandleMessage) -> Self {
        let k = raw.kline;
        Self {
            event_type: raw.event_type,
            event_time: raw.event_time,
            symbol: raw.symbol,
            start_time: k.start_time,
            close_time: k.close_time,
            first_trade_id: k.first_trade_id,
            last_trade_id: k.last_trade_id,
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
            trades: k.trades,
            interval: k.interval,
            is_final: k.is_final,
            quote_volume: k.quote_volume,
            buy_volume: k.buy_volume,
            quote_buy_volume: k.quote_buy_volume,
        }
    }
}

/// Raw trade (`<symbol>@trade`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct TradeEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "T"), skip_serializing_if = "Option::is_none")]
    pub trade_time: Option<u64>,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    #[serde(rename(deserialize = "p"))]
    pub price: Decimal,
    #[serde(rename(deserialize = "q"))]
    pub quantity: Decimal,
    #[serde(rename(deserialize = "m"))]
    pub is_buyer_maker: bool,
    /// Ignored by Binance clients but forwarded as-is.
    #[serde(rename(deserialize = "M"), skip_serializing_if = "Option::is_none")]
    pub maker: Option<bool>,
    #[serde(rename(deserialize = "t"))]
    pub trade_id: u64,
    #[serde(rename(deserialize = "a"), skip_serializing_if = "Option::is_none")]
    pub seller_order_id: Option<u64>,
    #[serde(rename(deserialize = "b"), skip_serializing_if = "Option::is_none")]
    pub buyer_order_id: Option<u64>,
}

/// Aggregate trade (`<symbol>@aggTrade`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct AggTradeEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "a"))]
    pub agg_id: u64,
    #[serde(rename(deserialize = "p"))]
    pub price: Decimal,
    #[serde(rename(deserialize = "q"))]
    pub quantity: Decimal,
    #[serde(rename(deserialize = "f"))]
    pub first_id: u64,
    #[serde(rename(deserialize = "l"))]
    pub last_id: u64,
    #[serde(rename(deserialize = "T"))]
    pub timestamp: u64,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    #[serde(rename(deserialize = "m"))]
    pub is_buyer_maker: bool,
    #[serde(rename(deserialize = "M"), skip_serializing_if = "Option::is_none")]
    pub was_best_price: Option<bool>,
}

/// Rolling 24h ticker (`<symbol>@ticker`, and each entry of `!ticker@arr`).
///
/// Futures tickers carry no best bid/ask and no previous close, hence the
/// optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct TickerEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    #[serde(rename(deserialize = "p"))]
    pub price_change: Decimal,
    #[serde(rename(deserialize = "P"))]
    pub price_change_percent: Decimal,
    #[serde(rename(deserialize = "w"))]
    pub weighted_avg: Decimal,
    #[serde(rename(deserialize = "x"), skip_serializing_if = "Option::is_none")]
    pub prev_day_close: Option<Decimal>,
    #[serde(rename(deserialize = "c"))]
    pub cur_day_close: Decimal,
    #[serde(rename(deserialize = "Q"))]
    pub close_trade_quantity: Decimal,
    #[serde(rename(deserialize = "b"), skip_serializing_if = "Option::is_none")]
    pub best_bid: Option<Decimal>,
    #[serde(rename(deserialize = "B"), skip_serializing_if = "Option::is_none")]
    pub best_bid_qnt: Option<Decimal>,
    #[serde(rename(deserialize = "a"), skip_serializing_if = "Option::is_none")]
    pub best_ask: Option<Decimal>,
    #[serde(rename(deserialize = "A"), skip_serializing_if = "Option::is_none")]
    pub best_ask_qnt: Option<Decimal>,
    #[serde(rename(deserialize = "o"))]
    pub open: Decimal,
    #[serde(rename(deserialize = "h"))]
    pub high: Decimal,
    #[serde(rename(deserialize = "l"))]
    pub low: Decimal,
    #[serde(rename(deserialize = "v"))]
    pub volume: Decimal,
    #[serde(rename(deserialize = "q"))]
    pub volume_quote: Decimal,
    #[serde(rename(deserialize = "O"))]
    pub open_time: u64,
    #[serde(rename(deserialize = "C"))]
    pub close_time: u64,
    #[serde(rename(deserialize = "F"))]
    pub first_trade_id: i64,
    #[serde(rename(deserialize = "L"))]
    pub last_trade_id: i64,
    #[serde(rename(deserialize = "n"))]
    pub total_trades: u64,
}

/// Futures mark price update (`<symbol>@markPrice@1s`, and each entry of
/// `!markPrice@arr@1s`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct MarkPriceEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    /// Mark price.
    #[serde(rename(deserialize = "p"))]
    pub price: Decimal,
    #[serde(rename(deserialize = "i"))]
    pub index_price: Decimal,
    #[serde(rename(deserialize = "r"))]
    pub funding_rate: Decimal,
    #[serde(rename(deserialize = "T"))]
    pub next_funding_time: u64,
}

/// Best bid/ask update (`<symbol>@bookTicker`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct BookTickerEvent {
    #[serde(rename(deserialize = "u"))]
    pub update_id: u64,
    #[serde(rename(deserialize = "E"), skip_serializing_if = "Option::is_none")]
    pub event_time: Option<u64>,
    /// Transaction time (futures only).
    #[serde(rename(deserialize = "T"), skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    #[serde(rename(deserialize = "b"))]
    pub bid_price: Decimal,
    #[serde(rename(deserialize = "B"))]
    pub bid_quantity: Decimal,
    #[serde(rename(deserialize = "a"))]
    pub ask_price: Decimal,
    #[serde(rename(deserialize = "A"))]
    pub ask_quantity: Decimal,
}

/// Futures liquidation order (`<symbol>@forceOrder`), flattened out of the
/// nested `o` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), from = "RawForceOrderMessage")]
pub struct ForceOrderEvent {
    pub event_type: String,
    pub event_time: u64,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub time_in_force: String,
    pub orig_qty: Decimal,
    pub price: Decimal,
    pub average_price: Decimal,
    pub status: String,
    pub last_filled_quantity: Decimal,
    pub filled_accumulated_quantity: Decimal,
    /// Order trade time.
    pub time: u64,
}

#[derive(Deserialize)]
struct RawForceOrderMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "E")]
    event_time: u64,
    #[serde(rename = "o")]
    order: RawForceOrder,
}

#[derive(Deserialize)]
struct RawForceOrder {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "S")]
    side: String,
    #[serde(rename = "o")]
    order_type: String,
    #[serde(rename = "f")]
    time_in_force: String,
    #[serde(rename = "q")]
    orig_qty: Decimal,
    #[serde(rename = "p")]
    price: Decimal,
    #[serde(rename = "ap")]
    average_price: Decimal,
    #[serde(rename = "X")]
    status: String,
    #[serde(rename = "l")]
    last_filled_quantity: Decimal,
    #[serde(rename = "z")]
    filled_accumulated_quantity: Decimal,
    #[serde(rename = "T")]
    time: u64,
}

impl From<RawForceOrderMessage> for ForceOrderEvent {
    fn from(raw: RawForceOrderMessage) -> Self {
        let o = raw.order;
        Self {
            event_type: raw.event_type,
            event_time: raw.event_time,
            symbol: o.symbol,
            side: o.side,
            order_type: o.order_type,
            time_in_force: o.time_in_force,
            orig_qty: o.orig_qty,
            price: o.price,
            average_price: o.average_price,
            status: o.status,
            last_filled_quantity: o.last_filled_quantity,
            filled_accumulated_quantity: o.filled_accumulated_quantity,
            time: o.time,
        }
    }
}
