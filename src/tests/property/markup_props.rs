//! Property-based tests for markup expansion
//!
//! Tests invariants:
//! - Expansion is total (never panics) on arbitrary input
//! - Expansion is idempotent: expand(expand(s)) == expand(s)
//! - Plain text without directives or dynamic tokens is a fixed point

use proptest::prelude::*;

use crate::core::bestiary::markup::{expand, MarkupContext};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Generate one well-formed directive from every family.
fn arb_directive() -> impl Strategy<Value = String> {
    prop_oneof![
        prop_oneof![
            Just("mw".to_string()),
            Just("rw".to_string()),
            Just("ms".to_string()),
            Just("rs".to_string()),
            Just("mw,rw".to_string()),
        ]
        .prop_map(|kind| format!("{{@atk {kind}}}")),
        (-5i64..15).prop_map(|n| format!("{{@hit {n}}}")),
        (1u32..9, 4u32..20).prop_map(|(c, s)| format!("{{@damage {c}d{s}+2}}")),
        "[a-z]{3,10}".prop_map(|name| format!("{{@condition {name}}}")),
        (5i64..25).prop_map(|n| format!("{{@dc {n}}}")),
        prop_oneof![
            Just("{@recharge}".to_string()),
            (4u32..6).prop_map(|n| format!("{{@recharge {n}}}")),
            Just("{@recharge 5-6}".to_string()),
        ],
        Just("{@h}".to_string()),
        // Unrecognized directives must also be stable.
        prop_oneof![
            Just("{@spell fireball|PHB}".to_string()),
            Just("{@item longsword}".to_string()),
            Just("{@creature goblin}".to_string()),
        ],
    ]
}

/// Interleave plain words, directives, and dynamic tokens.
fn arb_markup_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[A-Za-z0-9 ,.()]{0,20}",
            arb_directive(),
            Just("PB".to_string()),
            Just("summonSpellLevel".to_string()),
        ],
        0..8,
    )
    .prop_map(|parts| parts.join(" "))
}

fn arb_context() -> impl Strategy<Value = MarkupContext> {
    (
        prop::option::of(1i64..7),
        prop::option::of(1i64..10),
    )
        .prop_map(|(pb, level)| MarkupContext {
            proficiency_bonus: pb.map(|n| n.to_string()),
            spell_level: level.map(|n| n.to_string()),
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn expansion_is_total(text in ".{0,200}", ctx in arb_context()) {
        // Must not panic on arbitrary input, braces included.
        let _ = expand(&text, &ctx);
    }

    #[test]
    fn expansion_is_idempotent(text in arb_markup_soup(), ctx in arb_context()) {
        let once = expand(&text, &ctx);
        let twice = expand(&once, &ctx);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn plain_text_is_a_fixed_point(text in "[a-z ,.]{0,80}") {
        let ctx = MarkupContext::default();
        prop_assert_eq!(expand(&text, &ctx), text);
    }

    #[test]
    fn output_contains_no_recognized_directives(text in arb_markup_soup()) {
        let ctx = MarkupContext::default();
        let out = expand(&text, &ctx);
        for marker in ["{@atk ", "{@dc ", "{@h}", "{@recharge"] {
            prop_assert!(!out.contains(marker), "unexpanded {marker} in {out:?}");
        }
    }
}
