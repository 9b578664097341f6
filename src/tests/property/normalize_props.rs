//! Property-based tests for field normalization
//!
//! Tests invariants:
//! - All equivalent AC shapes normalize to the same integer
//! - CR display round-trips through parsing
//! - Ability modifiers match the floor formula across the score range
//! - Normalization is total over arbitrary JSON field shapes

use proptest::prelude::*;
use serde_json::json;

use crate::core::bestiary::normalize::{
    ability_modifier, format_cr, normalize, normalize_ac, normalize_cr,
};
use crate::core::bestiary::types::CreatureRecord;

proptest! {
    #[test]
    fn ac_shapes_are_equivalent(ac in 1i64..30) {
        let shapes = [
            json!(ac),
            json!([ac]),
            json!([{"ac": ac, "from": ["natural armor"]}]),
            json!({"ac": ac}),
        ];
        for shape in &shapes {
            prop_assert_eq!(normalize_ac(Some(shape)), ac);
        }
    }

    #[test]
    fn cr_display_round_trips(cr in prop_oneof![
        Just(0.125f64),
        Just(0.25),
        Just(0.5),
        (0i64..31).prop_map(|n| n as f64),
    ]) {
        let display = format_cr(cr);
        prop_assert_eq!(normalize_cr(Some(&json!(display))), cr);
    }

    #[test]
    fn ability_modifier_matches_floor_formula(score in 1i64..31) {
        let expected = ((score - 10) as f64 / 2.0).floor() as i64;
        prop_assert_eq!(ability_modifier(score), expected);
    }

    #[test]
    fn normalization_is_total(
        ac in arb_json_shape(),
        hp in arb_json_shape(),
        speed in arb_json_shape(),
        cr in arb_json_shape(),
    ) {
        // Arbitrary shapes must coerce to defaults, never panic.
        let record = CreatureRecord::from_value(json!({
            "name": "Fuzz Subject",
            "ac": ac,
            "hp": hp,
            "speed": speed,
            "cr": cr,
        })).unwrap();
        let normalized = normalize(&record);
        prop_assert_eq!(normalized.name, "Fuzz Subject");
    }
}

/// Arbitrary shallow JSON values in the shapes bestiary data gets wrong.
fn arb_json_shape() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(|b| json!(b)),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z0-9/ .]{0,10}".prop_map(|s| json!(s)),
        Just(json!([])),
        Just(json!({})),
        Just(json!([{"unexpected": true}])),
    ]
}
