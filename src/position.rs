// 4.0: open position tracking. pnl = sign * (mark - open) * quantity.
// positions are created by a successful placement and destroyed by cancellation
// or liquidation. quantity and margin_reserved never change after open; the
// only in-place mutation is the transient pnl field refreshed on each
// valuation pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::market::AssetQuote;
use crate::scale::{descale, Scale, USD_SCALE};
use crate::types::{Bps, EntryId, OrderId, Side, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: OrderId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub asset: String,
    #[serde(rename = "type")]
    pub side: Side,
    #[serde(rename = "qty")]
    pub quantity: Decimal,
    pub leverage: u32,
    /// Reserved collateral, USD-scaled integer. Fixed at open.
    #[serde(rename = "margin")]
    pub margin_reserved: i64,
    /// Execution price at open, scaled to the asset's integer representation.
    #[serde(rename = "openPrice")]
    pub open_price: i64,
    #[serde(rename = "slippage")]
    pub slippage_tolerance_bp: Bps,
    #[serde(rename = "openedAt")]
    pub opened_at: Timestamp,
    #[serde(rename = "originEntryId")]
    pub origin_entry_id: EntryId,
    /// Last computed pnl, USD-scaled integer. Transient; refreshed by the
    /// valuation sweep, not part of the position's identity.
    #[serde(default)]
    pub pnl: i64,
}

impl Position {
    pub fn open_price_value(&self, scale: Scale) -> Decimal {
        descale(self.open_price, scale)
    }

    pub fn margin_value(&self) -> Decimal {
        descale(self.margin_reserved, USD_SCALE)
    }
}

// 4.1: the valuation formulas, free functions so the math is testable
// without an engine around it.

/// Close-out price for a position: a long sells into the bid, a short buys
/// back at the ask.
pub fn mark_price(quote: &AssetQuote, side: Side) -> Decimal {
    match side {
        Side::Long => quote.bid_price(),
        Side::Short => quote.ask_price(),
    }
}

/// Signed pnl of a position against a mark price.
pub fn unrealized_pnl(side: Side, open_price: Decimal, mark: Decimal, quantity: Decimal) -> Decimal {
    side.sign() * (mark - open_price) * quantity
}

/// All open positions, keyed by owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionBook {
    positions: HashMap<UserId, Vec<Position>>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: Position) {
        self.positions
            .entry(position.user_id.clone())
            .or_default()
            .push(position);
    }

    pub fn find(&self, user_id: &UserId, order_id: &OrderId) -> Option<&Position> {
        self.positions
            .get(user_id)
            .and_then(|open| open.iter().find(|p| &p.id == order_id))
    }

    /// Remove one position. Empty per-user vecs are dropped so users with no
    /// open positions don't linger in the map.
    pub fn remove(&mut self, user_id: &UserId, order_id: &OrderId) -> Option<Position> {
        let open = self.positions.get_mut(user_id)?;
        let idx = open.iter().position(|p| &p.id == order_id)?;
        let removed = open.remove(idx);
        if open.is_empty() {
            self.positions.remove(user_id);
        }
        Some(removed)
    }

    pub fn positions_for(&self, user_id: &UserId) -> &[Position] {
        self.positions.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_pnl(&mut self, user_id: &UserId, order_id: &OrderId, pnl: i64) {
        if let Some(open) = self.positions.get_mut(user_id) {
            if let Some(p) = open.iter_mut().find(|p| &p.id == order_id) {
                p.pnl = pnl;
            }
        }
    }

    /// Owners in sorted order. The liquidation sweep walks users this way so
    /// replays emit closures in an identical sequence.
    pub fn users_sorted(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.positions.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn total_open(&self) -> usize {
        self.positions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
