//! Field Normalization Module
//!
//! The bestiary dialect encodes the same semantic value in numerous
//! shapes: an armor class may be a bare integer, an array of integers, an
//! array of `{ac, from}` objects, or an `{ac}` object; a speed may be a
//! number, a string, or a per-mode object. Each coercion function here
//! accepts every shape the dialect allows (plus absence) and produces
//! exactly one canonical output shape, so downstream consumers never see
//! an is-this-an-array check.
//!
//! Malformed shapes never propagate an error: every field has a
//! documented default and falls back to it. One malformed creature must
//! not block rendering of all others.

use serde_json::Value;

use super::types::{CreatureRecord, Entry, Feature, SizeCode};

// ============================================================================
// Defaults
// ============================================================================

/// AC when absent or malformed.
pub const DEFAULT_AC: i64 = 10;
/// HP average when absent or malformed.
pub const DEFAULT_HP_AVERAGE: i64 = 10;
/// Walk speed when absent or malformed.
pub const DEFAULT_WALK_SPEED: i64 = 30;
/// Creature type when absent or malformed.
pub const DEFAULT_TYPE: &str = "creature";

// ============================================================================
// Canonical output shapes
// ============================================================================

/// Canonical hit points: average plus optional dice formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitPoints {
    pub average: i64,
    pub formula: Option<String>,
}

impl Default for HitPoints {
    fn default() -> Self {
        Self {
            average: DEFAULT_HP_AVERAGE,
            formula: None,
        }
    }
}

/// Canonical speed: walk always present, other modes optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speed {
    pub walk: i64,
    pub burrow: Option<i64>,
    pub climb: Option<i64>,
    pub fly: Option<i64>,
    pub swim: Option<i64>,
}

impl Default for Speed {
    fn default() -> Self {
        Self {
            walk: DEFAULT_WALK_SPEED,
            burrow: None,
            climb: None,
            fly: None,
            swim: None,
        }
    }
}

/// Canonical creature type: base string plus display tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureType {
    pub base: String,
    pub tags: Vec<String>,
}

impl Default for CreatureType {
    fn default() -> Self {
        Self {
            base: DEFAULT_TYPE.to_string(),
            tags: Vec::new(),
        }
    }
}

impl CreatureType {
    /// Display form: `"base (tag, tag)"`, base alone when untagged.
    pub fn display(&self) -> String {
        if self.tags.is_empty() {
            self.base.clone()
        } else {
            format!("{} ({})", self.base, self.tags.join(", "))
        }
    }
}

/// Six ability scores, defaulting to 10.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abilities {
    pub str: i64,
    pub dex: i64,
    pub con: i64,
    pub int: i64,
    pub wis: i64,
    pub cha: i64,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            str: 10,
            dex: 10,
            con: 10,
            int: 10,
            wis: 10,
            cha: 10,
        }
    }
}

impl Abilities {
    /// (label, score) pairs in canonical STR..CHA order.
    pub fn iter(&self) -> [(&'static str, i64); 6] {
        [
            ("STR", self.str),
            ("DEX", self.dex),
            ("CON", self.con),
            ("INT", self.int),
            ("WIS", self.wis),
            ("CHA", self.cha),
        ]
    }
}

/// A fully normalized creature: one canonical shape per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedCreature {
    pub name: String,
    pub source: String,
    pub sizes: Vec<SizeCode>,
    pub creature_type: CreatureType,
    pub alignment: String,
    pub ac: i64,
    pub hp: HitPoints,
    pub speed: Speed,
    pub abilities: Abilities,
    pub saves: Vec<(String, String)>,
    pub skills: Vec<(String, String)>,
    pub vulnerable: Vec<String>,
    pub resist: Vec<String>,
    pub immune: Vec<String>,
    pub condition_immune: Vec<String>,
    pub senses: Vec<String>,
    pub passive: Option<i64>,
    pub languages: Vec<String>,
    pub cr: f64,
    pub traits: Vec<Feature>,
    pub spellcasting: Vec<Feature>,
    pub actions: Vec<Feature>,
    pub bonus_actions: Vec<Feature>,
    pub reactions: Vec<Feature>,
    pub legendary: Vec<Feature>,
}

impl NormalizedCreature {
    /// Size display: codes joined with "or" for multi-size creatures.
    pub fn size_display(&self) -> String {
        self.sizes
            .iter()
            .map(|s| s.display_name().to_string())
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Canonical size: the first declared code.
    pub fn size(&self) -> SizeCode {
        self.sizes.first().copied().unwrap_or(SizeCode::Medium)
    }

    /// Challenge rating in display form ("1/8", "1/4", "1/2", "2").
    pub fn cr_display(&self) -> String {
        format_cr(self.cr)
    }
}

// ============================================================================
// Top-level normalization
// ============================================================================

/// Normalize every field of a raw record into its canonical shape.
pub fn normalize(record: &CreatureRecord) -> NormalizedCreature {
    let f = &record.fields;
    NormalizedCreature {
        name: record.name().to_string(),
        source: record.source().to_string(),
        sizes: normalize_size(f.get("size")),
        creature_type: normalize_type(f.get("type")),
        alignment: normalize_alignment(f.get("alignment")),
        ac: normalize_ac(f.get("ac")),
        hp: normalize_hp(f.get("hp")),
        speed: normalize_speed(f.get("speed")),
        abilities: normalize_abilities(record),
        saves: normalize_bonus_map(f.get("save")),
        skills: normalize_bonus_map(f.get("skill")),
        vulnerable: normalize_damage_list(f.get("vulnerable"), "vulnerable"),
        resist: normalize_damage_list(f.get("resist"), "resist"),
        immune: normalize_damage_list(f.get("immune"), "immune"),
        condition_immune: normalize_damage_list(f.get("conditionImmune"), "conditionImmune"),
        senses: normalize_string_list(f.get("senses")),
        passive: normalize_passive(f.get("passive")),
        languages: normalize_string_list(f.get("languages")),
        cr: normalize_cr(f.get("cr")),
        traits: normalize_features(f.get("trait")),
        spellcasting: normalize_spellcasting(f.get("spellcasting")),
        actions: normalize_features(f.get("action")),
        bonus_actions: normalize_features(f.get("bonus")),
        reactions: normalize_features(f.get("reaction")),
        legendary: normalize_features(f.get("legendary")),
    }
}

// ============================================================================
// Per-field coercion
// ============================================================================

/// AC: bare integer, array of (integer | {ac, from?}), or {ac} object.
/// Canonical output is the first value found; default 10.
pub fn normalize_ac(value: Option<&Value>) -> i64 {
    fn first_ac(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => leading_int(s),
            Value::Array(items) => items.iter().find_map(first_ac),
            Value::Object(obj) => obj.get("ac").and_then(first_ac),
            _ => None,
        }
    }
    value.and_then(first_ac).unwrap_or(DEFAULT_AC)
}

/// HP: bare integer, {average, formula?}, or {special}.
pub fn normalize_hp(value: Option<&Value>) -> HitPoints {
    match value {
        Some(Value::Number(n)) => HitPoints {
            average: n.as_i64().unwrap_or(DEFAULT_HP_AVERAGE),
            formula: None,
        },
        Some(Value::Object(obj)) => {
            if let Some(average) = obj.get("average").and_then(Value::as_i64) {
                HitPoints {
                    average,
                    formula: obj
                        .get("formula")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                }
            } else if let Some(special) = obj.get("special").and_then(Value::as_str) {
                // "{special}" shape: salvage a leading number when there is one.
                HitPoints {
                    average: leading_int(special).unwrap_or(DEFAULT_HP_AVERAGE),
                    formula: None,
                }
            } else {
                HitPoints::default()
            }
        }
        _ => HitPoints::default(),
    }
}

/// Speed: bare integer (walk), "N ft." string, or per-mode object where
/// each mode is an int, string, or {number, condition?}.
pub fn normalize_speed(value: Option<&Value>) -> Speed {
    fn mode_value(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => leading_int(s),
            Value::Object(obj) => obj.get("number").and_then(mode_value),
            // `"fly": true` style flags carry no number.
            _ => None,
        }
    }
    match value {
        Some(Value::Number(n)) => Speed {
            walk: n.as_i64().unwrap_or(DEFAULT_WALK_SPEED),
            ..Speed::default()
        },
        Some(Value::String(s)) => Speed {
            walk: leading_int(s).unwrap_or(DEFAULT_WALK_SPEED),
            ..Speed::default()
        },
        Some(Value::Object(obj)) => Speed {
            walk: obj
                .get("walk")
                .and_then(mode_value)
                .unwrap_or(DEFAULT_WALK_SPEED),
            burrow: obj.get("burrow").and_then(mode_value),
            climb: obj.get("climb").and_then(mode_value),
            fly: obj.get("fly").and_then(mode_value),
            swim: obj.get("swim").and_then(mode_value),
        },
        _ => Speed::default(),
    }
}

/// Size: single-letter code or array of codes; default Medium.
pub fn normalize_size(value: Option<&Value>) -> Vec<SizeCode> {
    let sizes: Vec<SizeCode> = match value {
        Some(Value::String(code)) => vec![SizeCode::from_code(code)],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(SizeCode::from_code)
            .collect(),
        _ => Vec::new(),
    };
    if sizes.is_empty() {
        vec![SizeCode::Medium]
    } else {
        sizes
    }
}

/// CR: integer, float, fraction string, or {cr} wrapper; default 0.
pub fn normalize_cr(value: Option<&Value>) -> f64 {
    fn parse_cr(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match s.trim() {
                "1/8" => Some(0.125),
                "1/4" => Some(0.25),
                "1/2" => Some(0.5),
                other => other.parse().ok(),
            },
            Value::Object(obj) => obj.get("cr").and_then(parse_cr),
            _ => None,
        }
    }
    value.and_then(parse_cr).unwrap_or(0.0)
}

/// Challenge rating display form (not storage): fractions map back to
/// "1/8"/"1/4"/"1/2", everything else to the decimal's string form.
pub fn format_cr(cr: f64) -> String {
    if cr == 0.125 {
        "1/8".to_string()
    } else if cr == 0.25 {
        "1/4".to_string()
    } else if cr == 0.5 {
        "1/2".to_string()
    } else if cr.fract() == 0.0 {
        format!("{}", cr as i64)
    } else {
        format!("{cr}")
    }
}

/// Type: string, or {type, tags?} where each tag is a string or
/// {tag, prefix?}; default "creature".
pub fn normalize_type(value: Option<&Value>) -> CreatureType {
    match value {
        Some(Value::String(base)) => CreatureType {
            base: base.clone(),
            tags: Vec::new(),
        },
        Some(Value::Object(obj)) => {
            let base = obj
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_TYPE)
                .to_string();
            let tags = obj
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(|tag| match tag {
                            Value::String(s) => Some(s.clone()),
                            Value::Object(t) => {
                                let name = t.get("tag").and_then(Value::as_str)?;
                                match t.get("prefix").and_then(Value::as_str) {
                                    Some(prefix) => {
                                        Some(format!("{}{}", prefix, name))
                                    }
                                    None => Some(name.to_string()),
                                }
                            }
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            CreatureType { base, tags }
        }
        _ => CreatureType::default(),
    }
}

/// Alignment letters composed into a phrase.
///
/// "U" → "unaligned", "A" → "any alignment"; otherwise the law/chaos
/// axis and good/evil axis compose, with "N" filling the missing axis.
pub fn normalize_alignment(value: Option<&Value>) -> String {
    fn letters(value: &Value) -> Vec<String> {
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .flat_map(|item| match item {
                    Value::String(s) => vec![s.clone()],
                    // {"alignment": [...], "chance": N} entries: take the letters.
                    Value::Object(obj) => obj
                        .get("alignment")
                        .map(letters)
                        .unwrap_or_default(),
                    _ => Vec::new(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    let codes: Vec<String> = value.map(letters).unwrap_or_default();
    let has = |c: &str| codes.iter().any(|l| l == c);

    if codes.is_empty() || has("U") {
        return "unaligned".to_string();
    }
    if has("A") {
        return "any alignment".to_string();
    }

    let law = if has("L") {
        Some("lawful")
    } else if has("C") {
        Some("chaotic")
    } else {
        None
    };
    let moral = if has("G") {
        Some("good")
    } else if has("E") {
        Some("evil")
    } else {
        None
    };

    match (law, moral, has("N")) {
        (Some(l), Some(m), _) => format!("{l} {m}"),
        (Some(l), None, true) => format!("{l} neutral"),
        (None, Some(m), true) => format!("neutral {m}"),
        (Some(l), None, false) => l.to_string(),
        (None, Some(m), false) => m.to_string(),
        (None, None, _) => "neutral".to_string(),
    }
}

/// save/skill maps: name → bonus string, order preserved.
pub fn normalize_bonus_map(value: Option<&Value>) -> Vec<(String, String)> {
    match value {
        Some(Value::Object(obj)) => obj
            .iter()
            .filter_map(|(name, bonus)| {
                let text = match bonus {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((name.clone(), text))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// senses/languages: bare string or array of strings.
pub fn normalize_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// passive perception: int or numeric string.
pub fn normalize_passive(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => leading_int(s),
        _ => None,
    }
}

/// resist/immune/vulnerable/conditionImmune: bare string, array of
/// strings, or array of conditional objects keyed by the field name.
/// Canonical output is a flat ordered display list; conditional entries
/// keep their note/condition appended.
pub fn normalize_damage_list(value: Option<&Value>, key: &str) -> Vec<String> {
    fn flatten(value: &Value, key: &str, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    flatten(item, key, out);
                }
            }
            Value::Object(obj) => {
                if let Some(special) = obj.get("special").and_then(Value::as_str) {
                    out.push(special.to_string());
                    return;
                }
                let Some(inner) = obj.get(key) else { return };
                let mut inner_list = Vec::new();
                flatten(inner, key, &mut inner_list);
                if inner_list.is_empty() {
                    return;
                }
                let joined = inner_list.join(", ");
                let note = obj
                    .get("note")
                    .and_then(Value::as_str)
                    .or_else(|| obj.get("cond").and_then(Value::as_str));
                match note {
                    Some(note) => out.push(format!("{joined} {note}")),
                    None => out.push(joined),
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    if let Some(value) = value {
        flatten(value, key, &mut out);
    }
    out
}

fn normalize_abilities(record: &CreatureRecord) -> Abilities {
    let score = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or(10)
    };
    Abilities {
        str: score("str"),
        dex: score("dex"),
        con: score("con"),
        int: score("int"),
        wis: score("wis"),
        cha: score("cha"),
    }
}

// ============================================================================
// Ability modifiers
// ============================================================================

/// `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i64) -> i64 {
    (score - 10).div_euclid(2)
}

/// Modifier with explicit sign ("+2", "-1", "+0").
pub fn format_modifier(modifier: i64) -> String {
    if modifier >= 0 {
        format!("+{modifier}")
    } else {
        format!("{modifier}")
    }
}

// ============================================================================
// Features and spellcasting
// ============================================================================

/// Parse a role-keyed feature array (trait/action/bonus/reaction/legendary).
/// Unparsable or unnamed entries are dropped — every feature surfaced to
/// the renderer carries a non-empty name.
pub fn normalize_features(value: Option<&Value>) -> Vec<Feature> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<Feature>(item.clone()).ok())
            .filter(|feature| !feature.name.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Flatten the dialect's spellcasting blocks into renderable features.
///
/// Each block becomes one feature: header entries first, then one line
/// per spell group (cantrips, leveled slots, at-will, daily).
pub fn normalize_spellcasting(value: Option<&Value>) -> Vec<Feature> {
    let Some(Value::Array(blocks)) = value else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(|block| {
            let obj = block.as_object()?;
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Spellcasting")
                .to_string();

            let mut entries: Vec<Entry> = obj
                .get("headerEntries")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| Entry::Text(s.to_string()))
                        .collect()
                })
                .unwrap_or_default();

            if let Some(will) = obj.get("will").and_then(Value::as_array) {
                entries.push(Entry::Text(format!(
                    "At will: {}",
                    spell_names(will).join(", ")
                )));
            }

            if let Some(daily) = obj.get("daily").and_then(Value::as_object) {
                for (uses, spells) in daily {
                    let Some(spells) = spells.as_array() else { continue };
                    // "3e" means three uses shared per spell ("each").
                    let label = match uses.strip_suffix('e') {
                        Some(n) => format!("{n}/day each"),
                        None => format!("{uses}/day"),
                    };
                    entries.push(Entry::Text(format!(
                        "{label}: {}",
                        spell_names(spells).join(", ")
                    )));
                }
            }

            if let Some(levels) = obj.get("spells").and_then(Value::as_object) {
                for (level, group) in levels {
                    let Some(group) = group.as_object() else { continue };
                    let spells = group
                        .get("spells")
                        .and_then(Value::as_array)
                        .map(|s| spell_names(s).join(", "))
                        .unwrap_or_default();
                    let line = if level == "0" {
                        format!("Cantrips (at will): {spells}")
                    } else {
                        match group.get("slots").and_then(Value::as_i64) {
                            Some(slots) => format!(
                                "{} level ({} slot{}): {spells}",
                                ordinal(level),
                                slots,
                                if slots == 1 { "" } else { "s" }
                            ),
                            None => format!("{} level: {spells}", ordinal(level)),
                        }
                    };
                    entries.push(Entry::Text(line));
                }
            }

            Some(Feature { name, entries })
        })
        .collect()
}

fn spell_names(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn ordinal(level: &str) -> String {
    match level {
        "1" => "1st".to_string(),
        "2" => "2nd".to_string(),
        "3" => "3rd".to_string(),
        other => format!("{other}th"),
    }
}

// ============================================================================
// Shared parsing helpers
// ============================================================================

/// Leading integer of a string ("30 ft." → 30, "16 (natural armor)" → 16).
fn leading_int(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let digits: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ============================================================================
// Tests
// ============================================================================
