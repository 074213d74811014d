//! User data stream messages.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An event received on a user data stream.
///
/// Event types without a dedicated shape are passed through as
/// [`UserEvent::Other`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserEvent {
    /// Balance change from a deposit, withdrawal or transfer.
    BalanceUpdate(BalanceUpdateEvent),
    /// Full account snapshot (`outboundAccountInfo`).
    Account(AccountEvent),
    /// Balances that changed with an account update.
    AccountPosition(AccountPositionEvent),
    /// Order update.
    ExecutionReport(ExecutionReportEvent),
    /// Any other event, fields unchanged.
    Other(UnknownUserEvent),
}

impl UserEvent {
    /// Canonical event type name.
    pub fn event_type(&self) -> Option<&str> {
        match self {
            UserEvent::BalanceUpdate(e) => Some(&e.event_type),
            UserEvent::Account(e) => Some(&e.event_type),
            UserEvent::AccountPosition(e) => Some(&e.event_type),
            UserEvent::ExecutionReport(e) => Some(&e.event_type),
            UserEvent::Other(e) => e.event_type.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct BalanceUpdateEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "a"))]
    pub asset: String,
    #[serde(rename(deserialize = "d"))]
    pub balance_delta: Decimal,
    #[serde(rename(deserialize = "T"))]
    pub clear_time: u64,
}

/// Account snapshot. The event type is reported as `"account"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), from = "RawAccountInfo")]
pub struct AccountEvent {
    pub event_type: String,
    pub event_time: u64,
    pub maker_commission_rate: Decimal,
    pub taker_commission_rate: Decimal,
    pub buyer_commission_rate: Decimal,
    pub seller_commission_rate: Decimal,
    pub can_trade: bool,
    pub can_withdraw: bool,
    pub can_deposit: bool,
    pub last_account_update: u64,
    /// Balances keyed by asset.
    pub balances: HashMap<String, AccountBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub available: Decimal,
    pub locked: Decimal,
}

#[derive(Deserialize)]
struct RawAccountInfo {
    #[serde(rename = "E")]
    event_time: u64,
    #[serde(rename = "m")]
    maker_commission_rate: Decimal,
    #[serde(rename = "t")]
    taker_commission_rate: Decimal,
    #[serde(rename = "b")]
    buyer_commission_rate: Decimal,
    #[serde(rename = "s")]
    seller_commission_rate: Decimal,
    #[serde(rename = "T")]
    can_trade: bool,
    #[serde(rename = "W")]
    can_withdraw: bool,
    #[serde(rename = "D")]
    can_deposit: bool,
    #[serde(rename = "u")]
    last_account_update: u64,
    #[serde(rename = "B")]
    balances: Vec<RawBalance>,
}

#[derive(Deserialize)]
struct RawBalance {
    #[serde(rename = "a")]
    asset: String,
    #[serde(rename = "f")]
    free: Decimal,
    #[serde(rename = "l")]
    locked: Decimal,
}

impl From<RawAccountInfo> for AccountEvent {
    fn from(raw: RawAccountInfo) -> Self {
        let balances = raw
            .balances
            .into_iter()
            .map(|b| {
                (
                    b.asset,
                    AccountBalance {
                        available: b.free,
                        locked: b.locked,
                    },
                )
            })
            .collect();

        Self {
            event_type: "account".to_string(),
            event_time: raw.event_time,
            maker_commission_rate: raw.maker_commission_rate,
            taker_commission_rate: raw.taker_commission_rate,
            buyer_commission_rate: raw.buyer_commission_rate,
            seller_commission_rate: raw.seller_commission_rate,
            can_trade: raw.can_trade,
            can_withdraw: raw.can_withdraw,
            can_deposit: raw.can_deposit,
            last_account_update: raw.last_account_update,
            balances,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), from = "RawAccountPosition")]
pub struct AccountPositionEvent {
    pub event_type: String,
    pub event_time: u64,
    pub last_account_update: u64,
    /// Changed balances in feed order.
    pub balances: Vec<AssetBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

#[derive(Deserialize)]
struct RawAccountPosition {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "E")]
    event_time: u64,
    #[serde(rename = "u")]
    last_account_update: u64,
    #[serde(rename = "B")]
    balances: Vec<RawBalance>,
}

impl From<RawAccountPosition> for AccountPositionEvent {
    fn from(raw: RawAccountPosition) -> Self {
        Self {
            event_type: raw.event_type,
            event_time: raw.event_time,
            last_account_update: raw.last_account_update,
            balances: raw
                .balances
                .into_iter()
                .map(|b| AssetBalance {
                    asset: b.asset,
                    free: b.free,
                    locked: b.locked,
                })
                .collect(),
        }
    }
}

/// Order update (`executionReport`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ExecutionReportEvent {
    #[serde(rename(deserialize = "e"))]
    pub event_type: String,
    #[serde(rename(deserialize = "E"))]
    pub event_time: u64,
    #[serde(rename(deserialize = "s"))]
    pub symbol: String,
    #[serde(rename(deserialize = "c"))]
    pub new_client_order_id: String,
    #[serde(rename(deserialize = "C"))]
    pub original_client_order_id: String,
    #[serde(rename(deserialize = "S"))]
    pub side: String,
    #[serde(rename(deserialize = "o"))]
    pub order_type: String,
    #[serde(rename(deserialize = "f"))]
    pub time_in_force: String,
    #[serde(rename(deserialize = "q"))]
    pub quantity: Decimal,
    #[serde(rename(deserialize = "p"))]
    pub price: Decimal,
    #[serde(rename(deserialize = "x"))]
    pub execution_type: String,
    #[serde(rename(deserialize = "P"))]
    pub stop_price: Decimal,
    #[serde(rename(deserialize = "F"))]
    pub iceberg_quantity: Decimal,
    #[serde(rename(deserialize = "X"))]
    pub order_status: String,
    #[serde(rename(deserialize = "r"))]
    pub order_reject_reason: String,
    #[serde(rename(deserialize = "i"))]
    pub order_id: u64,
    #[serde(rename(deserialize = "T"))]
    pub order_time: u64,
    #[serde(rename(deserialize = "l"))]
    pub last_trade_quantity: Decimal,
    #[serde(rename(deserialize = "z"))]
    pub total_trade_quantity: Decimal,
    #[serde(rename(deserialize = "L"))]
    pub price_last_trade: Decimal,
    #[serde(rename(deserialize = "n"))]
    pub commission: Decimal,
    #[serde(rename(deserialize = "N"), skip_serializing_if = "Option::is_none")]
    pub commission_asset: Option<String>,
    /// `-1` until the order trades.
    #[serde(rename(deserialize = "t"))]
    pub trade_id: i64,
    #[serde(rename(deserialize = "w"))]
    pub is_order_working: bool,
    #[serde(rename(deserialize = "m"))]
    pub is_buyer_maker: bool,
    #[serde(rename(deserialize = "O"))]
    pub creation_time: u64,
    #[serde(rename(deserialize = "Z"))]
    pub total_quote_trade_quantity: Decimal,
    #[serde(rename(deserialize = "g"), skip_serializing_if = "Option::is_none")]
    pub order_list_id: Option<i64>,
    #[serde(rename(deserialize = "Q"), skip_serializing_if = "Option::is_none")]
    pub quote_order_quantity: Option<Decimal>,
    #[serde(rename(deserialize = "Y"), skip_serializing_if = "Option::is_none")]
    pub last_quote_transacted: Option<Decimal>,
}

/// A user data event of a type this crate has no dedicated shape for.
///
/// Serializes as `{"type": <wire event type>, ...remaining wire fields}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownUserEvent {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}
