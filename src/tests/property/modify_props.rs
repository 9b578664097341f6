//! Property-based tests for the modification interpreter
//!
//! Tests invariants:
//! - `appendIfNotExistsArr` is idempotent
//! - `removeArr` then `appendArr` of the same named item round-trips size
//! - Applying an op never panics regardless of target shape

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::core::bestiary::modify::{apply_modifications, ModSpec};
use crate::core::bestiary::types::JsonMap;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

fn arb_feature_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}"
}

/// A record whose `action` property holds named entries.
fn arb_record(names: Vec<String>) -> JsonMap {
    let entries: Vec<Value> = names
        .iter()
        .map(|name| json!({"name": name, "entries": ["body"]}))
        .collect();
    match json!({"name": "Subject", "action": entries}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Arbitrary JSON leaf shapes a malformed record might hold.
fn arb_target_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z ]{0,12}".prop_map(Value::String),
        Just(json!({"name": "Bite"})),
        Just(json!([{"name": "Bite"}, "bare string"])),
    ]
}

fn mod_spec(value: Value) -> ModSpec {
    serde_json::from_value(value).expect("valid spec")
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn append_if_not_exists_is_idempotent(
        existing in prop::collection::vec(arb_feature_name(), 0..5),
        added in prop::collection::vec(arb_feature_name(), 1..4),
    ) {
        let items: Vec<Value> = added
            .iter()
            .map(|name| json!({"name": name, "entries": ["x"]}))
            .collect();
        let spec = mod_spec(json!({
            "action": {"mode": "appendIfNotExistsArr", "items": items}
        }));

        let mut record = arb_record(existing);
        apply_modifications(&mut record, &spec);
        let after_once = record.clone();
        apply_modifications(&mut record, &spec);
        prop_assert_eq!(record, after_once);
    }

    #[test]
    fn remove_then_append_restores_length(
        names in prop::collection::vec(arb_feature_name(), 1..6),
        target in arb_feature_name(),
    ) {
        let mut record = arb_record(names.clone());
        let before = record["action"].as_array().unwrap().len();
        let removed = names.iter().filter(|n| **n == target).count();

        apply_modifications(&mut record, &mod_spec(json!({
            "action": {"mode": "removeArr", "names": target.clone()}
        })));
        prop_assert_eq!(
            record["action"].as_array().unwrap().len(),
            before - removed
        );

        apply_modifications(&mut record, &mod_spec(json!({
            "action": {"mode": "appendArr", "items": [{"name": target, "entries": []}]}
        })));
        prop_assert_eq!(
            record["action"].as_array().unwrap().len(),
            before - removed + 1
        );
    }

    #[test]
    fn ops_never_panic_on_arbitrary_targets(target in arb_target_value()) {
        let mut record = match json!({"name": "Subject", "action": target}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        for spec in [
            json!({"action": {"mode": "removeArr", "names": "Bite"}}),
            json!({"action": {"mode": "appendArr", "items": {"name": "Tail"}}}),
            json!({"action": {"mode": "replaceTxt", "replace": "a", "with": "b"}}),
            json!({"action": {"mode": "renameArr", "rename": {"name": "Bite", "with": "Fangs"}}}),
            json!({"_": {"mode": "maxSize", "max": "L"}}),
            json!({"_": {"mode": "addSenses", "senses": "darkvision 60 ft."}}),
        ] {
            apply_modifications(&mut record, &mod_spec(spec));
        }
    }
}
