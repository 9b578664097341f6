//! Inline Markup Expansion Module
//!
//! Expands the bracketed `{@tag args}` directives embedded in bestiary
//! free text into plain display strings. The directive set is a tiny
//! closed micro-grammar (tag name + optional argument string), matched by
//! a single regex — not chained string replacement — so no family's
//! replacement text can be re-matched by a later rule.
//!
//! Expansion is pure and total: unrecognized directives pass through
//! unchanged, and already-expanded text is a fixed point
//! (`expand(expand(s)) == expand(s)`).
//!
//! # Example
//!
//! ```ignore
//! use crate::core::bestiary::markup::{expand, MarkupContext};
//!
//! let ctx = MarkupContext::default();
//! let out = expand("{@atk mw} {@hit 4} to hit. {@h}7 ({@damage 1d8+3}) slashing.", &ctx);
//! assert_eq!(out, "Melee Weapon Attack: +4 to hit. Hit: 7 (1d8+3) slashing.");
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// ============================================================================
// Regexes
// ============================================================================

/// Matches one directive: `{@tag}` or `{@tag args}`.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{@(\w+)(?: +([^{}]*))?\}").expect("valid directive regex"));

/// Bare-word proficiency bonus token.
static PB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bPB\b").expect("valid PB regex"));

/// Bare-word spell level token.
static SPELL_LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsummonSpellLevel\b").expect("valid spell level regex"));

// ============================================================================
// MarkupContext
// ============================================================================

/// Caller-supplied values for dynamic tokens.
///
/// When a value is absent the token expands to a generic phrase
/// ("your proficiency bonus" / "the spell's level") instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupContext {
    pub proficiency_bonus: Option<String>,
    pub spell_level: Option<String>,
}

impl MarkupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proficiency_bonus(mut self, pb: impl ToString) -> Self {
        self.proficiency_bonus = Some(pb.to_string());
        self
    }

    pub fn with_spell_level(mut self, level: impl ToString) -> Self {
        self.spell_level = Some(level.to_string());
        self
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Expand all markup directives in `text` into plain display text.
pub fn expand(text: &str, ctx: &MarkupContext) -> String {
    let expanded = TAG_RE.replace_all(text, |caps: &Captures| {
        let tag = &caps[1];
        let args = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();
        match expand_directive(tag, args) {
            Some(replacement) => replacement,
            // Unrecognized directive: pass through verbatim.
            None => caps[0].to_string(),
        }
    });

    let expanded = PB_RE.replace_all(&expanded, {
        let pb = ctx
            .proficiency_bonus
            .clone()
            .unwrap_or_else(|| "your proficiency bonus".to_string());
        move |_: &Captures| pb.clone()
    });

    let expanded = SPELL_LEVEL_RE.replace_all(&expanded, {
        let level = ctx
            .spell_level
            .clone()
            .unwrap_or_else(|| "the spell's level".to_string());
        move |_: &Captures| level.clone()
    });

    expanded.into_owned()
}

/// Expand a single recognized directive, or `None` to pass it through.
fn expand_directive(tag: &str, args: &str) -> Option<String> {
    match tag {
        "atk" => attack_label(args),
        "hit" => hit_bonus(args),
        "damage" | "dice" => Some(pipe_display(args).to_string()),
        "condition" => Some(pipe_display(args).to_string()),
        "dc" => Some(format!("DC {}", args)),
        "recharge" => Some(recharge_label(args)),
        "h" => Some("Hit: ".to_string()),
        _ => None,
    }
}

/// `{@atk mw}` family: attack-kind marker to its literal label plus colon.
///
/// The comma forms (`mw,rw` / `ms,rs`) render as the combined
/// "Melee or Ranged ... Attack:" label.
fn attack_label(args: &str) -> Option<String> {
    let label = match args {
        "mw" => "Melee Weapon Attack:",
        "rw" => "Ranged Weapon Attack:",
        "ms" => "Melee Spell Attack:",
        "rs" => "Ranged Spell Attack:",
        "mw,rw" | "rw,mw" => "Melee or Ranged Weapon Attack:",
        "ms,rs" | "rs,ms" => "Melee or Ranged Spell Attack:",
        _ => return None,
    };
    Some(label.to_string())
}

/// `{@hit N}`: numeric argument rendered as a signed modifier.
fn hit_bonus(args: &str) -> Option<String> {
    let n: i64 = args.parse().ok()?;
    if n >= 0 {
        Some(format!("+{n}"))
    } else {
        Some(format!("{n}"))
    }
}

/// `{@recharge}` / `{@recharge N}` / `{@recharge N-M}`.
fn recharge_label(args: &str) -> String {
    if args.is_empty() {
        return "Recharge".to_string();
    }
    match args.split_once('-') {
        Some((lo, hi)) if !lo.is_empty() && !hi.is_empty() => {
            format!("Recharge {}\u{2013}{}", lo.trim(), hi.trim())
        }
        _ => format!("Recharge {args}"),
    }
}

/// Pick the display segment of a pipe-separated argument.
///
/// The source dialect writes `{@tag text|source|displayText}`; the third
/// segment overrides the first when present.
fn pipe_display(args: &str) -> &str {
    let parts: Vec<&str> = args.split('|').collect();
    match parts.get(2) {
        Some(display) if !display.is_empty() => display,
        _ => parts[0],
    }
}

// ============================================================================
// Tests
// ============================================================================
