//! Market state: the latest bid/ask/scale for every known asset.
//!
//! Quotes are wholly replaced on each price update for their symbol; no
//! history is retained. Placement, valuation, and liquidation all read from
//! here and nothing else mutates it.

use crate::scale::{descale, Scale};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest quote for one tradable asset. Bid/ask are integers scaled by
/// `10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub bid: i64,
    pub ask: i64,
    #[serde(rename = "decimal")]
    pub scale: Scale,
}

impl AssetQuote {
    pub fn bid_price(&self) -> Decimal {
        descale(self.bid, self.scale)
    }

    pub fn ask_price(&self) -> Decimal {
        descale(self.ask, self.scale)
    }
}

/// All known quotes, keyed by asset symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteBoard {
    quotes: HashMap<String, AssetQuote>,
}

impl QuoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset: &str) -> Option<&AssetQuote> {
        self.quotes.get(asset)
    }

    /// Replace the quote for one symbol. The whole quote is swapped; a price
    /// update never patches individual fields.
    pub fn set(&mut self, asset: String, quote: AssetQuote) {
        self.quotes.insert(asset, quote);
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn descaled_accessors() {
        let quote = AssetQuote {
            bid: 60000,
            ask: 60010,
            scale: Scale(0),
        };
        assert_eq!(quote.bid_price(), dec!(60000));
        assert_eq!(quote.ask_price(), dec!(60010));

        let scaled = AssetQuote {
            bid: 6_000_050,
            ask: 6_001_025,
            scale: Scale(2),
        };
        assert_eq!(scaled.bid_price(), dec!(60000.50));
        assert_eq!(scaled.ask_price(), dec!(60010.25));
    }

    #[test]
    fn set_replaces_whole_quote() {
        let mut board = QuoteBoard::new();
        assert!(board.get("BTC").is_none());

        board.set(
            "BTC".to_string(),
            AssetQuote { bid: 1, ask: 2, scale: Scale(0) },
        );
        board.set(
            "BTC".to_string(),
            AssetQuote { bid: 3, ask: 4, scale: Scale(1) },
        );

        let quote = board.get("BTC").unwrap();
        assert_eq!(quote.bid, 3);
        assert_eq!(quote.scale, Scale(1));
        assert_eq!(board.len(), 1);
    }
}
