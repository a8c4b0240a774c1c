//! Order placement and cancellation.

use rust_decimal::Decimal;

use super::core::MarginEngine;
use super::results::EngineError;
use crate::events::{
    CancelOrder, CloseReason, Outcome, OrderClosed, OrderOpened, OrderRejected, PlaceOrder,
    RejectReason,
};
use crate::position::{mark_price, unrealized_pnl, Position};
use crate::scale::{rescale, USD_SCALE};
use crate::types::{EntryId, OrderId, Side, UserId};

/// Acceptable execution band around a reference price. A long tolerates
/// prices up to `reference * (1 + t)`, a short down to `reference * (1 - t)`;
/// neither side accepts a price better than the reference it was quoted,
/// matching the band the API layer shows the user.
pub fn acceptable_band(side: Side, reference: Decimal, tolerance: Decimal) -> (Decimal, Decimal) {
    match side {
        Side::Long => (reference, reference * (Decimal::ONE + tolerance)),
        Side::Short => (reference * (Decimal::ONE - tolerance), reference),
    }
}

impl MarginEngine {
    /// Admission chain for a new order. Every step before the ledger debit is
    /// a potential typed rejection; once the debit happens the position is
    /// inserted unconditionally.
    pub(super) fn place_order(
        &mut self,
        entry_id: &EntryId,
        order: PlaceOrder,
    ) -> Result<Outcome, EngineError> {
        let PlaceOrder {
            asset,
            side,
            margin,
            leverage,
            slippage_tolerance_bp,
            id,
            user_id,
        } = order;

        let Some(quote) = self.quotes.get(&asset).copied() else {
            return Ok(Outcome::Rejected(OrderRejected::new(
                entry_id.clone(),
                id,
                RejectReason::PriceUnavailable,
                format!("Price not available for {asset}. Please try again later."),
            )));
        };

        let free_margin = self
            .ledgers
            .get_or_materialize(&user_id, self.config.starting_free_margin)
            .free_margin;
        if free_margin < margin {
            return Ok(Outcome::Rejected(OrderRejected::new(
                entry_id.clone(),
                id,
                RejectReason::InsufficientBalance,
                "Your balance is too low to place this order.".to_string(),
            )));
        }

        // reference execution price: a long lifts the ask, a short hits the bid
        let reference = match side {
            Side::Long => quote.ask_price(),
            Side::Short => quote.bid_price(),
        };

        let (min_acceptable, max_acceptable) =
            acceptable_band(side, reference, slippage_tolerance_bp.as_fraction());

        // re-read at execution time. identical to the reference under
        // synchronous processing; the band starts mattering the moment price
        // application can interleave with order evaluation.
        let execution_price = match side {
            Side::Long => quote.ask_price(),
            Side::Short => quote.bid_price(),
        };
        if execution_price < min_acceptable || execution_price > max_acceptable {
            return Ok(Outcome::Rejected(OrderRejected::new(
                entry_id.clone(),
                id,
                RejectReason::SlippageExceeded,
                "Slippage too high. Order rejected.".to_string(),
            )));
        }

        let quantity = margin * Decimal::from(leverage) / execution_price;

        self.ledgers
            .get_or_materialize(&user_id, self.config.starting_free_margin)
            .reserve(margin)
            .map_err(|source| EngineError::Ledger {
                user_id: user_id.clone(),
                source,
            })?;

        let position = Position {
            id,
            user_id,
            asset,
            side,
            quantity,
            leverage,
            margin_reserved: rescale(margin, USD_SCALE),
            open_price: rescale(execution_price, quote.scale),
            slippage_tolerance_bp,
            opened_at: self.current_time,
            origin_entry_id: entry_id.clone(),
            pnl: 0,
        };
        self.positions.insert(position.clone());

        Ok(Outcome::Opened(OrderOpened { position }))
    }

    pub(super) fn cancel_order(
        &mut self,
        entry_id: &EntryId,
        cancel: CancelOrder,
    ) -> Result<Outcome, EngineError> {
        let CancelOrder { order_id, user_id } = cancel;

        if self.positions.find(&user_id, &order_id).is_none() {
            return Ok(Outcome::Rejected(OrderRejected::new(
                entry_id.clone(),
                order_id.clone(),
                RejectReason::OrderNotFound,
                format!("Order with orderId {order_id} not found!"),
            )));
        }

        let closed = self.close_position(&user_id, &order_id, CloseReason::UserClosed)?;
        Ok(Outcome::Closed(closed))
    }

    /// Shared close path for cancellation and liquidation: settle pnl into
    /// the ledger and remove the position in one synchronous step.
    pub(super) fn close_position(
        &mut self,
        user_id: &UserId,
        order_id: &OrderId,
        close_reason: CloseReason,
    ) -> Result<OrderClosed, EngineError> {
        let Some(mut position) = self.positions.remove(user_id, order_id) else {
            // callers check existence first; reaching here is a book bug
            return Err(EngineError::PositionVanished {
                order_id: order_id.clone(),
            });
        };

        let Some(quote) = self.quotes.get(&position.asset).copied() else {
            return Err(EngineError::QuoteMissing {
                asset: position.asset.clone(),
                order_id: order_id.clone(),
            });
        };

        let close_price = mark_price(&quote, position.side);
        let open_price = position.open_price_value(quote.scale);
        let pnl = unrealized_pnl(position.side, open_price, close_price, position.quantity);

        let ledger = self
            .ledgers
            .get_or_materialize(user_id, self.config.starting_free_margin);
        ledger
            .release(position.margin_value(), pnl)
            .map_err(|source| EngineError::Ledger {
                user_id: user_id.clone(),
                source,
            })?;
        let final_free_margin = ledger.free_margin;

        position.pnl = rescale(pnl, USD_SCALE);

        Ok(OrderClosed {
            close_price: rescale(close_price, quote.scale),
            closed_at: self.current_time,
            final_free_margin: rescale(final_free_margin, USD_SCALE),
            close_reason,
            position,
        })
    }
}
