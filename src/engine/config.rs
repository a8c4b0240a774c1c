//! Engine configuration options.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Equity-to-initial-margin ratio at or below which a position is
    /// force-liquidated.
    pub maintenance_fraction: Decimal,
    /// Free margin granted to a user on first touch.
    pub starting_free_margin: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maintenance_fraction: dec!(0.1),
            starting_free_margin: dec!(5000),
        }
    }
}
