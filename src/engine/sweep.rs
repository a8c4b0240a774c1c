//! Price application and the liquidation sweep.
//!
//! Every price update replaces its quotes atomically, then revalues every
//! open position across every user. The sweep walks users in sorted key
//! order, so a replay of the same entries emits closures in an identical
//! sequence. Positions do not interact; each liquidation settles its ledger
//! and leaves the book in one synchronous step.

use std::collections::HashMap;

use super::core::MarginEngine;
use super::results::EngineError;
use crate::events::{CloseReason, Outcome};
use crate::market::AssetQuote;
use crate::position::{mark_price, unrealized_pnl};
use crate::scale::{rescale, USD_SCALE};
use crate::types::{OrderId, UserId};

impl MarginEngine {
    pub(super) fn apply_price_update(
        &mut self,
        quotes: HashMap<String, AssetQuote>,
    ) -> Result<Vec<Outcome>, EngineError> {
        for (asset, quote) in quotes {
            self.quotes.set(asset, quote);
        }
        self.run_sweep()
    }

    /// Revalue all open positions against the current quote board and
    /// force-close every position whose equity has fallen to the maintenance
    /// fraction of its initial margin or below.
    fn run_sweep(&mut self) -> Result<Vec<Outcome>, EngineError> {
        let mut valuations: Vec<(UserId, OrderId, i64)> = Vec::new();
        let mut breached: Vec<(UserId, OrderId)> = Vec::new();

        for user_id in self.positions.users_sorted() {
            for position in self.positions.positions_for(&user_id) {
                // assets untouched by this update value against their cached quote
                let Some(quote) = self.quotes.get(&position.asset) else {
                    return Err(EngineError::QuoteMissing {
                        asset: position.asset.clone(),
                        order_id: position.id.clone(),
                    });
                };

                let mark = mark_price(quote, position.side);
                let open = position.open_price_value(quote.scale);
                let pnl = unrealized_pnl(position.side, open, mark, position.quantity);

                valuations.push((user_id.clone(), position.id.clone(), rescale(pnl, USD_SCALE)));

                let margin = position.margin_value();
                let equity = margin + pnl;
                if equity <= margin * self.config.maintenance_fraction {
                    breached.push((user_id.clone(), position.id.clone()));
                }
            }
        }

        for (user_id, order_id, pnl) in valuations {
            self.positions.set_pnl(&user_id, &order_id, pnl);
        }

        let mut outcomes = Vec::with_capacity(breached.len());
        for (user_id, order_id) in breached {
            let closed = self.close_position(&user_id, &order_id, CloseReason::Liquidation)?;
            outcomes.push(Outcome::Closed(closed));
        }
        Ok(outcomes)
    }
}
