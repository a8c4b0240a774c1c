//! Property-based tests for the margin math.
//!
//! These verify the admission band, pnl signs, margin conservation, and the
//! liquidation threshold under random inputs.

use margin_core::*;
use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1_000i64..100_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $10 to $1M
}

fn margin_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=4_000i64).prop_map(Decimal::from) // fits the 5000 starting ledger
}

fn leverage_strategy() -> impl Strategy<Value = u32> {
    2u32..=50u32
}

fn tolerance_strategy() -> impl Strategy<Value = Bps> {
    (0u32..=1_000u32).prop_map(Bps::new) // up to 10%
}

fn within(band: (Decimal, Decimal), price: Decimal) -> bool {
    // the exact comparison the admission chain performs
    !(price < band.0 || price > band.1)
}

proptest! {
    /// Long band: the upper edge is accepted, anything past it rejected,
    /// and nothing below the quoted reference is accepted either.
    #[test]
    fn long_band_edges(reference in price_strategy(), tolerance in tolerance_strategy()) {
        let band = acceptable_band(Side::Long, reference, tolerance.as_fraction());
        let upper = reference * (Decimal::ONE + tolerance.as_fraction());
        let epsilon = Decimal::new(1, 10);

        prop_assert!(within(band, reference));
        prop_assert!(within(band, upper));
        prop_assert!(!within(band, upper + epsilon));
        prop_assert!(!within(band, reference - epsilon));
    }

    /// Short band, mirrored.
    #[test]
    fn short_band_edges(reference in price_strategy(), tolerance in tolerance_strategy()) {
        let band = acceptable_band(Side::Short, reference, tolerance.as_fraction());
        let lower = reference * (Decimal::ONE - tolerance.as_fraction());
        let epsilon = Decimal::new(1, 10);

        prop_assert!(within(band, reference));
        prop_assert!(within(band, lower));
        prop_assert!(!within(band, lower - epsilon));
        prop_assert!(!within(band, reference + epsilon));
    }

    /// Pnl sign follows the side.
    #[test]
    fn pnl_sign_matches_side(
        open in price_strategy(),
        mark in price_strategy(),
        qty_raw in 1i64..10_000i64,
    ) {
        let quantity = Decimal::new(qty_raw, 4);
        let long = unrealized_pnl(Side::Long, open, mark, quantity);
        let short = unrealized_pnl(Side::Short, open, mark, quantity);

        prop_assert_eq!(long, -short);
        if mark > open {
            prop_assert!(long > Decimal::ZERO);
        } else if mark < open {
            prop_assert!(long < Decimal::ZERO);
        } else {
            prop_assert_eq!(long, Decimal::ZERO);
        }
    }

    /// An open-then-close round trip at an unchanged quote conserves margin:
    /// the user pays exactly the spread, never more, and used margin returns
    /// to zero.
    #[test]
    fn immediate_round_trip_conserves_margin(
        margin in margin_strategy(),
        leverage in leverage_strategy(),
        bid_raw in 1_000i64..10_000_000i64,
        spread_raw in 1i64..100i64,
    ) {
        let mut engine = MarginEngine::new(EngineConfig::default());
        engine.set_time(Timestamp::from_millis(1));

        let quotes = HashMap::from([(
            "BTC".to_string(),
            AssetQuote { bid: bid_raw, ask: bid_raw + spread_raw, scale: Scale(2) },
        )]);
        engine
            .apply(&EntryId("1-0".to_string()), InboundEvent::PriceUpdate(quotes))
            .unwrap();

        engine
            .apply(
                &EntryId("2-0".to_string()),
                InboundEvent::PlaceOrder(PlaceOrder {
                    asset: "BTC".to_string(),
                    side: Side::Long,
                    margin,
                    leverage,
                    slippage_tolerance_bp: Bps::new(100),
                    id: OrderId("ord-1".to_string()),
                    user_id: UserId("u1".to_string()),
                }),
            )
            .unwrap();

        let ask = Decimal::new(bid_raw + spread_raw, 2);
        let bid = Decimal::new(bid_raw, 2);
        let quantity = margin * Decimal::from(leverage) / ask;
        let spread_cost = (ask - bid) * quantity;

        // a thin spread never threatens the maintenance line here, so the
        // close must be user-driven, not a liquidation
        prop_assume!(spread_cost < margin * dec!(0.5));

        let outcomes = engine
            .apply(
                &EntryId("3-0".to_string()),
                InboundEvent::CancelOrder(CancelOrder {
                    order_id: OrderId("ord-1".to_string()),
                    user_id: UserId("u1".to_string()),
                }),
            )
            .unwrap();

        let Outcome::Closed(closed) = &outcomes[0] else {
            panic!("expected close, got {outcomes:?}");
        };
        prop_assert_eq!(closed.close_reason, CloseReason::UserClosed);

        let ledger = engine.ledgers().get(&UserId("u1".to_string())).unwrap();
        prop_assert_eq!(ledger.used_margin, Decimal::ZERO);
        prop_assert_eq!(ledger.free_margin, dec!(5000) - spread_cost);
    }

    /// The liquidation threshold: a bid safely above the boundary keeps the
    /// position open, a bid safely below closes it on that tick.
    #[test]
    fn liquidation_threshold_straddle(
        margin in margin_strategy(),
        leverage in leverage_strategy(),
        ask_raw in 10_000i64..10_000_000i64,
    ) {
        let mut engine = MarginEngine::new(EngineConfig::default());
        engine.set_time(Timestamp::from_millis(1));

        let quotes = HashMap::from([(
            "BTC".to_string(),
            AssetQuote { bid: ask_raw - 1, ask: ask_raw, scale: Scale(0) },
        )]);
        engine
            .apply(&EntryId("1-0".to_string()), InboundEvent::PriceUpdate(quotes))
            .unwrap();
        engine
            .apply(
                &EntryId("2-0".to_string()),
                InboundEvent::PlaceOrder(PlaceOrder {
                    asset: "BTC".to_string(),
                    side: Side::Long,
                    margin,
                    leverage,
                    slippage_tolerance_bp: Bps::new(100),
                    id: OrderId("ord-1".to_string()),
                    user_id: UserId("u1".to_string()),
                }),
            )
            .unwrap();

        // equity(bid) = m + (bid - ask) * qty hits 0.1m at
        // bid = ask * (1 - 0.9 / leverage)
        let ask = Decimal::from(ask_raw);
        let boundary = ask * (Decimal::ONE - dec!(0.9) / Decimal::from(leverage));

        let safe_bid = (boundary + dec!(2)).ceil();
        let breach_bid = (boundary - dec!(2)).floor();
        prop_assume!(breach_bid > Decimal::ZERO);

        let to_i64 = |d: Decimal| -> i64 { d.to_i64().unwrap() };

        let quotes = HashMap::from([(
            "BTC".to_string(),
            AssetQuote { bid: to_i64(safe_bid), ask: to_i64(safe_bid) + 1, scale: Scale(0) },
        )]);
        let outcomes = engine
            .apply(&EntryId("3-0".to_string()), InboundEvent::PriceUpdate(quotes))
            .unwrap();
        prop_assert!(outcomes.is_empty(), "liquidated above the boundary");

        let quotes = HashMap::from([(
            "BTC".to_string(),
            AssetQuote { bid: to_i64(breach_bid), ask: to_i64(breach_bid) + 1, scale: Scale(0) },
        )]);
        let outcomes = engine
            .apply(&EntryId("4-0".to_string()), InboundEvent::PriceUpdate(quotes))
            .unwrap();
        prop_assert_eq!(outcomes.len(), 1, "failed to liquidate below the boundary");
    }
}
