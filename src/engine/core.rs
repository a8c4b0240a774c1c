// 7.1 engine/core.rs: main engine. exclusively owns the quote board, the
// ledgers, and the position book; every mutation flows through apply().

use super::config::EngineConfig;
use super::results::EngineError;
use crate::events::{InboundEvent, Outcome};
use crate::ledger::LedgerBook;
use crate::market::QuoteBoard;
use crate::position::PositionBook;
use crate::snapshot::EngineSnapshot;
use crate::types::{EntryId, Timestamp};

#[derive(Debug)]
pub struct MarginEngine {
    pub(super) config: EngineConfig,
    pub(super) quotes: QuoteBoard,
    pub(super) ledgers: LedgerBook,
    pub(super) positions: PositionBook,
    pub(super) last_applied: EntryId,
    pub(super) current_time: Timestamp,
}

impl MarginEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            quotes: QuoteBoard::new(),
            ledgers: LedgerBook::new(),
            positions: PositionBook::new(),
            last_applied: EntryId::beginning(),
            current_time: Timestamp::from_millis(0),
        }
    }

    /// Rebuild engine state from a restored snapshot.
    pub fn from_snapshot(config: EngineConfig, snapshot: EngineSnapshot) -> Self {
        Self {
            config,
            quotes: snapshot.quotes,
            ledgers: snapshot.ledgers,
            positions: snapshot.positions,
            last_applied: snapshot.last_entry_id,
            current_time: Timestamp::from_millis(0),
        }
    }

    /// Point-in-time copy of all mutable state plus the replay offset. The
    /// caller captures this under its lock; later engine mutation cannot
    /// retroactively alter the copy.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            taken_at: self.current_time,
            last_entry_id: self.last_applied.clone(),
            quotes: self.quotes.clone(),
            ledgers: self.ledgers.clone(),
            positions: self.positions.clone(),
        }
    }

    /// Apply one input entry to completion, including every liquidation it
    /// triggers, and record it as the last processed offset. Returns the
    /// outcomes to publish: exactly one for place/cancel, zero or more
    /// closures for a price update.
    pub fn apply(
        &mut self,
        entry_id: &EntryId,
        event: InboundEvent,
    ) -> Result<Vec<Outcome>, EngineError> {
        let outcomes = match event {
            InboundEvent::PlaceOrder(order) => vec![self.place_order(entry_id, order)?],
            InboundEvent::CancelOrder(cancel) => vec![self.cancel_order(entry_id, cancel)?],
            InboundEvent::PriceUpdate(quotes) => self.apply_price_update(quotes)?,
        };
        self.last_applied = entry_id.clone();
        Ok(outcomes)
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn last_applied(&self) -> &EntryId {
        &self.last_applied
    }

    pub fn quotes(&self) -> &QuoteBoard {
        &self.quotes
    }

    pub fn ledgers(&self) -> &LedgerBook {
        &self.ledgers
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }
}
