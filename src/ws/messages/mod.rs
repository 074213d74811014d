//! Binance WebSocket message types and normalization.
//!
//! [`normalize`] maps one decoded wire message of a market stream to its
//! canonical [`StreamEvent`]; [`normalize_user`] does the same for user data
//! streams, falling back to a pass-through shape for unknown event types.
//! Both are pure.

mod market_data;
mod user_data;

pub use market_data::*;
pub use user_data::*;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StreamError;
use crate::ws::streams::StreamKind;

/// A canonical event delivered to subscription callbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Depth(DepthEvent),
    PartialDepth(PartialDepthEvent),
    Candle(CandleEvent),
    Trade(TradeEvent),
    AggTrade(AggTradeEvent),
    Ticker(TickerEvent),
    /// Every entry of one `!ticker@arr` frame.
    Tickers(Vec<TickerEvent>),
    MarkPrice(MarkPriceEvent),
    /// Every entry of one `!markPrice@arr@1s` frame.
    MarkPrices(Vec<MarkPriceEvent>),
    BookTicker(BookTickerEvent),
    ForceOrder(ForceOrderEvent),
}

/// Normalize one decoded market stream message.
///
/// Array streams produce a single batched event holding every entry of the
/// frame in order.
pub fn normalize(kind: &StreamKind, raw: Value) -> Result<StreamEvent, StreamError> {
    let event = match kind {
        StreamKind::Depth { .. } => StreamEvent::Depth(serde_json::from_value(raw)?),
        StreamKind::PartialDepth(target) => {
            let mut event: PartialDepthEvent = serde_json::from_value(raw)?;
            event.symbol = target.symbol.clone();
            event.level = target.level;
            StreamEvent::PartialDepth(event)
        }
        StreamKind::Candles { .. } => StreamEvent::Candle(serde_json::from_value(raw)?),
        StreamKind::Trades { .. } => StreamEvent::Trade(serde_json::from_value(raw)?),
        StreamKind::AggTrades { .. } => StreamEvent::AggTrade(serde_json::from_value(raw)?),
        StreamKind::Ticker { .. } => StreamEvent::Ticker(serde_json::from_value(raw)?),
        StreamKind::AllTickers => StreamEvent::Tickers(normalize_batch(raw)?),
        StreamKind::MarkPrice { .. } => StreamEvent::MarkPrice(serde_json::from_value(raw)?),
        StreamKind::AllMarkPrices => StreamEvent::MarkPrices(normalize_batch(raw)?),
        StreamKind::BookTicker { .. } => StreamEvent::BookTicker(serde_json::from_value(raw)?),
        StreamKind::ForceOrder { .. } => StreamEvent::ForceOrder(serde_json::from_value(raw)?),
    };

    Ok(event)
}

/// Normalize one decoded user data stream message.
pub fn normalize_user(raw: Value) -> Result<UserEvent, StreamError> {
    let event_type = raw
        .get("e")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let event = match event_type.as_str() {
        "balanceUpdate" => UserEvent::BalanceUpdate(serde_json::from_value(raw)?),
        "outboundAccountInfo" => UserEvent::Account(serde_json::from_value(raw)?),
        "outboundAccountPosition" => UserEvent::AccountPosition(serde_json::from_value(raw)?),
        "executionReport" => UserEvent::ExecutionReport(serde_json::from_value(raw)?),
        _ => {
            tracing::debug!("Passing through user event of type {:?}", event_type);
            UserEvent::Other(passthrough(raw)?)
        }
    };

    Ok(event)
}

/// Decode a text frame and normalize it for the given stream.
pub fn decode(kind: &StreamKind, text: &str) -> Result<StreamEvent, StreamError> {
    normalize(kind, serde_json::from_str(text)?)
}

/// Decode a user data text frame and normalize it.
pub fn decode_user(text: &str) -> Result<UserEvent, StreamError> {
    normalize_user(serde_json::from_str(text)?)
}

fn normalize_batch<T: DeserializeOwned>(raw: Value) -> Result<Vec<T>, StreamError> {
    match raw {
        Value::Array(entries) => entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).map_err(StreamError::from))
            .collect(),
        other => Err(StreamError::InvalidResponse(format!(
            "Expected an array frame, got: {other}"
        ))),
    }
}

fn passthrough(raw: Value) -> Result<UnknownUserEvent, StreamError> {
    let Value::Object(mut fields) = raw else {
        return Err(StreamError::InvalidResponse(format!(
            "Expected a JSON object, got: {raw}"
        )));
    };

    let event_type = match fields.remove("e") {
        Some(Value::String(event_type)) => Some(event_type),
        Some(other) => Some(other.to_string()),
        None => None,
    };

    Ok(UnknownUserEvent { event_type, fields })
}
