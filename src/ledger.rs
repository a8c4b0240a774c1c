//! User margin ledgers: free vs. used collateral.
//!
//! A user with no prior activity is lazily materialized with a fixed starting
//! free margin. The `free_margin >= 0` invariant is enforced by admission
//! checks before any mutation; a transition that would break it anyway means
//! the state machine itself is wrong, which is a fatal error, not a rejection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginLedger {
    #[serde(rename = "freeMargin")]
    pub free_margin: Decimal,
    #[serde(rename = "usedMargin")]
    pub used_margin: Decimal,
}

impl MarginLedger {
    pub fn starting(free_margin: Decimal) -> Self {
        Self {
            free_margin,
            used_margin: Decimal::ZERO,
        }
    }

    /// Move `margin` from free to used. Caller has already admitted the
    /// order, so a shortfall here is an invariant violation.
    pub fn reserve(&mut self, margin: Decimal) -> Result<(), LedgerError> {
        if margin > self.free_margin {
            return Err(LedgerError::NegativeFreeMargin {
                free: self.free_margin - margin,
            });
        }
        self.free_margin -= margin;
        self.used_margin += margin;
        Ok(())
    }

    /// Release a reservation and settle pnl (positive or negative) into free
    /// margin.
    pub fn release(&mut self, margin: Decimal, pnl: Decimal) -> Result<(), LedgerError> {
        self.used_margin -= margin;
        self.free_margin += margin + pnl;
        if self.free_margin < Decimal::ZERO {
            return Err(LedgerError::NegativeFreeMargin {
                free: self.free_margin,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("free margin would go negative: {free}")]
    NegativeFreeMargin { free: Decimal },
}

/// All user ledgers. Unknown users materialize on first touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerBook {
    ledgers: HashMap<UserId, MarginLedger>,
}

impl LedgerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &UserId) -> Option<&MarginLedger> {
        self.ledgers.get(user_id)
    }

    pub fn get_or_materialize(
        &mut self,
        user_id: &UserId,
        starting_free_margin: Decimal,
    ) -> &mut MarginLedger {
        self.ledgers
            .entry(user_id.clone())
            .or_insert_with(|| MarginLedger::starting(starting_free_margin))
    }

    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn materializes_once() {
        let mut book = LedgerBook::new();
        let user = UserId("u1".to_string());

        {
            let ledger = book.get_or_materialize(&user, dec!(5000));
            assert_eq!(ledger.free_margin, dec!(5000));
            ledger.reserve(dec!(1000)).unwrap();
        }

        // second touch sees the mutated ledger, not a fresh one
        let ledger = book.get_or_materialize(&user, dec!(5000));
        assert_eq!(ledger.free_margin, dec!(4000));
        assert_eq!(ledger.used_margin, dec!(1000));
    }

    #[test]
    fn reserve_rejects_overdraft() {
        let mut ledger = MarginLedger::starting(dec!(100));
        assert!(ledger.reserve(dec!(101)).is_err());
        // failed reserve leaves the ledger untouched
        assert_eq!(ledger.free_margin, dec!(100));
        assert_eq!(ledger.used_margin, Decimal::ZERO);
    }

    #[test]
    fn release_settles_pnl() {
        let mut ledger = MarginLedger::starting(dec!(5000));
        ledger.reserve(dec!(1000)).unwrap();

        ledger.release(dec!(1000), dec!(-250)).unwrap();
        assert_eq!(ledger.free_margin, dec!(4750));
        assert_eq!(ledger.used_margin, Decimal::ZERO);
    }

    #[test]
    fn release_flags_negative_free_margin() {
        let mut ledger = MarginLedger::starting(dec!(1000));
        ledger.reserve(dec!(1000)).unwrap();
        // a loss bigger than the whole ledger can only come from broken math
        assert!(ledger.release(dec!(1000), dec!(-1500)).is_err());
    }
}
