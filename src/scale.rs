// 2.0: fixed-point wire model. every monetary or asset quantity crossing the
// boundary is an integer scaled by 10^scale. descale before arithmetic,
// rescale before emission. mixing scales is the bug class this module exists
// to prevent, so conversions only happen here.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places carried by an integer wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale(pub u32);

impl Scale {
    pub fn value(&self) -> u32 {
        self.0
    }
}

// USD-denominated amounts (margin, balances, pnl) always use this scale.
pub const USD_SCALE: Scale = Scale(6);

/// Integer wire value -> decimal. Exact, no rounding involved.
pub fn descale(raw: i64, scale: Scale) -> Decimal {
    Decimal::new(raw, scale.0)
}

/// Decimal -> integer wire value at the given scale. Truncates toward zero;
/// sub-scale precision does not survive the wire.
pub fn rescale(value: Decimal, scale: Scale) -> i64 {
    let shifted = value * Decimal::from(10i64.pow(scale.0));
    shifted.trunc().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn descale_is_exact() {
        assert_eq!(descale(60010, Scale(0)), dec!(60010));
        assert_eq!(descale(60010, Scale(2)), dec!(600.10));
        assert_eq!(descale(1_000_000_000, USD_SCALE), dec!(1000));
        assert_eq!(descale(-5, Scale(1)), dec!(-0.5));
    }

    #[test]
    fn rescale_truncates() {
        assert_eq!(rescale(dec!(1000), USD_SCALE), 1_000_000_000);
        assert_eq!(rescale(dec!(600.10), Scale(2)), 60010);
        // 0.1666... at scale 6 keeps exactly six places
        assert_eq!(rescale(dec!(0.16663889), USD_SCALE), 166638);
        assert_eq!(rescale(dec!(-1001.4997), USD_SCALE), -1_001_499_700);
    }

    #[test]
    fn scale_zero_is_identity() {
        assert_eq!(rescale(descale(42, Scale(0)), Scale(0)), 42);
    }
}
