// 6.0: the wire codec. inbound trading intents as they appear on the input
// stream, outcome events as they are published to the results stream, and the
// reject taxonomy. every outcome echoes the full order payload so downstream
// projection never needs a second lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::market::AssetQuote;
use crate::position::Position;
use crate::types::{Bps, EntryId, OrderId, Side, Timestamp, UserId};

// 6.1: inbound intents. one JSON document per stream entry:
// {"event": "PLACE_ORDER", "data": {...}}. an unrecognized "event" kind fails
// decoding, which the driver treats as a poison entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    #[serde(rename = "PLACE_ORDER")]
    PlaceOrder(PlaceOrder),
    #[serde(rename = "CANCEL_ORDER")]
    CancelOrder(CancelOrder),
    /// One or many quotes replaced atomically before the valuation sweep runs.
    #[serde(rename = "PRICE_UPDATE")]
    PriceUpdate(HashMap<String, AssetQuote>),
}

impl InboundEvent {
    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub asset: String,
    #[serde(rename = "type")]
    pub side: Side,
    /// Collateral to reserve, in whole USD units as entered by the user.
    pub margin: Decimal,
    pub leverage: u32,
    #[serde(rename = "slippage")]
    pub slippage_tolerance_bp: Bps,
    pub id: OrderId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrder {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

// 6.2: outcomes. exactly one per consumed entry that requires a response;
// price updates produce zero or more closures and no direct response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Outcome {
    #[serde(rename = "ORDER_OPENED")]
    Opened(OrderOpened),
    #[serde(rename = "ORDER_CLOSED")]
    Closed(OrderClosed),
    #[serde(rename = "ORDER_REJECTED")]
    Rejected(OrderRejected),
}

impl Outcome {
    pub fn encode(&self) -> String {
        // the outcome enum only contains plain data types, serialization
        // cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOpened {
    #[serde(flatten)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderClosed {
    /// The closed position, pnl field carrying the realized USD-scaled pnl.
    #[serde(flatten)]
    pub position: Position,
    /// Realized close price, scaled to the asset's integer representation.
    #[serde(rename = "closePrice")]
    pub close_price: i64,
    #[serde(rename = "closedAt")]
    pub closed_at: Timestamp,
    /// Owner's free margin after settlement, USD-scaled.
    #[serde(rename = "finalFreeMargin")]
    pub final_free_margin: i64,
    #[serde(rename = "closeReason")]
    pub close_reason: CloseReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "USER_CLOSED")]
    UserClosed,
    #[serde(rename = "LIQUIDATION")]
    Liquidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejected {
    #[serde(rename = "originEntryId")]
    pub origin_entry_id: EntryId,
    pub id: OrderId,
    #[serde(rename = "reasonCode")]
    pub reason: RejectReason,
    #[serde(rename = "errorStatus")]
    pub error_status: u16,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl OrderRejected {
    pub fn new(origin_entry_id: EntryId, id: OrderId, reason: RejectReason, message: String) -> Self {
        Self {
            origin_entry_id,
            id,
            error_status: reason.status(),
            error_message: message,
            reason,
        }
    }
}

// 6.3: admission rejections are expected business outcomes, reported back as
// typed values and never raised as errors. the status is a protocol hint the
// correlating API layer maps onto its own transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    PriceUnavailable,
    InsufficientBalance,
    SlippageExceeded,
    OrderNotFound,
}

impl RejectReason {
    pub fn status(&self) -> u16 {
        match self {
            RejectReason::PriceUnavailable => 503,
            RejectReason::InsufficientBalance => 403,
            RejectReason::SlippageExceeded => 422,
            RejectReason::OrderNotFound => 400,
        }
    }
}
