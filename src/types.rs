// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, sides, tolerances, timestamps. each is a newtype so the compiler catches type mixups.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// IDs are strings: the API layer assigns order ids and the transport assigns
// entry ids, neither of which the engine generates itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

// 1.1: transport-assigned position of one event in the ordered input log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Offset meaning "replay from the beginning of pending".
    pub fn beginning() -> Self {
        Self("0".to_string())
    }

    /// Transport ids order as `millis-seq` pairs. Ids that don't follow the
    /// scheme don't participate in ordering.
    pub fn sequence(&self) -> Option<(u64, u64)> {
        match self.0.split_once('-') {
            Some((ms, seq)) => Some((ms.parse().ok()?, seq.parse().ok()?)),
            None => self.0.parse().ok().map(|ms| (ms, 0)),
        }
    }

    /// True when both ids order and `self` is not newer than `other`. Used to
    /// recognize redelivered entries a restored snapshot already covers.
    pub fn is_at_or_before(&self, other: &EntryId) -> bool {
        match (self.sequence(), other.sequence()) {
            (Some(a), Some(b)) => a <= b,
            _ => false,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Long => dec!(1),
            Side::Short => dec!(-1),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

// 1.2: basis points. 100 bps = 1%. slippage tolerance on the wire is bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bps(pub u32);

impl Bps {
    pub fn new(bps: u32) -> Self {
        Self(bps)
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }
}

// 1.3: millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_sign() {
        assert_eq!(Side::Long.sign(), dec!(1));
        assert_eq!(Side::Short.sign(), dec!(-1));
    }

    #[test]
    fn bps_conversion() {
        assert_eq!(Bps::new(100).as_fraction(), dec!(0.01)); // 1%
        assert_eq!(Bps::new(50).as_fraction(), dec!(0.005)); // 0.5%
        assert_eq!(Bps::new(0).as_fraction(), Decimal::ZERO);
    }

    #[test]
    fn entry_id_ordering() {
        let a = EntryId("100-1".to_string());
        let b = EntryId("100-2".to_string());
        let c = EntryId("200-0".to_string());

        assert!(a.is_at_or_before(&b));
        assert!(b.is_at_or_before(&c));
        assert!(a.is_at_or_before(&a));
        assert!(!c.is_at_or_before(&a));

        // the cold-start offset precedes every real id
        assert!(EntryId::beginning().is_at_or_before(&a));

        // opaque ids never compare
        let opaque = EntryId("not-numeric".to_string());
        assert!(!opaque.is_at_or_before(&a));
        assert!(!a.is_at_or_before(&opaque));
    }

    #[test]
    fn side_wire_form() {
        assert_eq!(serde_json::to_string(&Side::Long).unwrap(), "\"LONG\"");
        let side: Side = serde_json::from_str("\"SHORT\"").unwrap();
        assert_eq!(side, Side::Short);
    }
}
