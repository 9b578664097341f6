//! Modification Interpreter Module
//!
//! A small interpreter for the declarative patch language records and
//! templates use to transform one another: a [`ModSpec`] maps a property
//! name (or the record root, key `"_"`) to one or more [`Modification`]
//! op-codes, applied in order against the raw JSON shape of a record.
//!
//! The op vocabulary is a closed, internally tagged enum rather than
//! dynamic dispatch, so it stays auditable and testable in isolation.
//!
//! Failure policy: this interpreter is best-effort over heterogeneous,
//! occasionally malformed source data. An op whose target property
//! doesn't support its mode is skipped silently (debug-logged) — it must
//! never raise for a well-formed-but-inapplicable operation.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{JsonMap, SizeCode};

/// Property key addressing the record root instead of a named property.
pub const ROOT_KEY: &str = "_";

// ============================================================================
// Op vocabulary
// ============================================================================

/// One declarative patch instruction.
///
/// Fields are defaulted so a structurally incomplete op deserializes to a
/// harmless no-op instead of poisoning the whole spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum Modification {
    /// Remove array entries whose name (or bare string value) matches.
    #[serde(rename = "removeArr")]
    RemoveArr {
        #[serde(default)]
        names: Value,
    },

    /// Append one or more items; auto-initializes the property.
    #[serde(rename = "appendArr")]
    AppendArr {
        #[serde(default)]
        items: Value,
    },

    /// Prepend one or more items; auto-initializes the property.
    #[serde(rename = "prependArr")]
    PrependArr {
        #[serde(default)]
        items: Value,
    },

    /// Append only items not already present (dedup by name/value).
    #[serde(rename = "appendIfNotExistsArr")]
    AppendIfNotExistsArr {
        #[serde(default)]
        items: Value,
    },

    /// Rename the first entry matching the old name.
    #[serde(rename = "renameArr")]
    RenameArr {
        #[serde(default)]
        rename: RenameSpec,
    },

    /// Replace the first matched entry (by name or direct value).
    #[serde(rename = "replaceArr")]
    ReplaceArr {
        #[serde(default)]
        replace: Value,
        #[serde(default)]
        items: Value,
    },

    /// Global textual find/replace over every string field of every
    /// array entry, recursing through nested objects and arrays.
    #[serde(rename = "replaceTxt")]
    ReplaceTxt {
        #[serde(default)]
        replace: String,
        #[serde(default)]
        with: String,
        #[serde(default)]
        flags: Option<String>,
    },

    /// Set a dot-separated nested property path to a literal value.
    #[serde(rename = "setProp")]
    SetProp {
        #[serde(default)]
        prop: String,
        #[serde(default)]
        value: Value,
    },

    /// Root op: append sense strings, dedup by exact string.
    #[serde(rename = "addSenses")]
    AddSenses {
        #[serde(default)]
        senses: Value,
    },

    /// Root op: merge a skill→bonus map, existing values win.
    #[serde(rename = "addSkills")]
    AddSkills {
        #[serde(default)]
        skills: JsonMap,
    },

    /// Root op: clamp size(s) to at most the given code.
    #[serde(rename = "maxSize")]
    MaxSize {
        #[serde(default)]
        max: String,
    },

    /// Unrecognized mode: a no-op.
    #[serde(other)]
    Unknown,
}

/// Old/new name pair for `renameArr`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub with: String,
}

/// One op or a list of ops for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(Modification),
    Many(Vec<Modification>),
}

impl OneOrMany {
    pub fn iter(&self) -> impl Iterator<Item = &Modification> {
        match self {
            OneOrMany::One(op) => std::slice::from_ref(op).iter(),
            OneOrMany::Many(ops) => ops.iter(),
        }
    }
}

/// Ordered map of property path (or [`ROOT_KEY`]) to modification ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModSpec(pub IndexMap<String, OneOrMany>);

impl ModSpec {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// Apply a modification spec to a record's raw fields, in declaration
/// order. Mutates and returns nothing; inapplicable ops are skipped.
pub fn apply_modifications(fields: &mut JsonMap, spec: &ModSpec) {
    for (prop, ops) in &spec.0 {
        for op in ops.iter() {
            if prop == ROOT_KEY {
                apply_root_op(fields, op);
            } else {
                apply_property_op(fields, prop, op);
            }
        }
    }
}

fn apply_root_op(fields: &mut JsonMap, op: &Modification) {
    match op {
        Modification::AddSenses { senses } => add_senses(fields, senses),
        Modification::AddSkills { skills } => add_skills(fields, skills),
        Modification::MaxSize { max } => clamp_size(fields, max),
        Modification::SetProp { prop, value } => set_prop(fields, prop, value),
        other => {
            tracing::debug!(op = ?other, "skipping non-root op addressed at record root");
        }
    }
}

fn apply_property_op(fields: &mut JsonMap, prop: &str, op: &Modification) {
    match op {
        Modification::RemoveArr { names } => remove_arr(fields, prop, names),
        Modification::AppendArr { items } => append_arr(fields, prop, items, Position::End),
        Modification::PrependArr { items } => append_arr(fields, prop, items, Position::Start),
        Modification::AppendIfNotExistsArr { items } => {
            append_if_not_exists(fields, prop, items)
        }
        Modification::RenameArr { rename } => rename_arr(fields, prop, rename),
        Modification::ReplaceArr { replace, items } => replace_arr(fields, prop, replace, items),
        Modification::ReplaceTxt {
            replace,
            with,
            flags,
        } => replace_txt(fields, prop, replace, with, flags.as_deref()),
        // setProp paths are rooted at the record regardless of grouping key.
        Modification::SetProp { prop: path, value } => set_prop(fields, path, value),
        Modification::AddSenses { .. }
        | Modification::AddSkills { .. }
        | Modification::MaxSize { .. } => {
            tracing::debug!(prop, "skipping root-level op addressed at a property");
        }
        Modification::Unknown => {
            tracing::debug!(prop, "skipping unrecognized modification mode");
        }
    }
}

// ============================================================================
// Array ops
// ============================================================================

enum Position {
    Start,
    End,
}

/// Single value or array of values, as a flat item list.
fn to_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// An entry's identity: its `name` field, or the string itself.
fn name_of(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj.get("name").and_then(Value::as_str),
        _ => None,
    }
}

/// Fetch the property as a mutable array, initializing when allowed.
fn target_array<'a>(
    fields: &'a mut JsonMap,
    prop: &str,
    initialize: bool,
) -> Option<&'a mut Vec<Value>> {
    if initialize && !fields.contains_key(prop) {
        fields.insert(prop.to_string(), Value::Array(Vec::new()));
    }
    match fields.get_mut(prop) {
        Some(Value::Array(items)) => Some(items),
        Some(_) => {
            tracing::debug!(prop, "modification target is not an array, skipping");
            None
        }
        None => None,
    }
}

fn remove_arr(fields: &mut JsonMap, prop: &str, names: &Value) {
    let targets: Vec<String> = to_items(names)
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    if let Some(items) = target_array(fields, prop, false) {
        items.retain(|entry| {
            name_of(entry)
                .map(|name| !targets.iter().any(|t| t == name))
                .unwrap_or(true)
        });
    }
}

fn append_arr(fields: &mut JsonMap, prop: &str, items: &Value, position: Position) {
    let new_items = to_items(items);
    if new_items.is_empty() {
        return;
    }
    if let Some(existing) = target_array(fields, prop, true) {
        match position {
            Position::End => existing.extend(new_items),
            Position::Start => {
                existing.splice(0..0, new_items);
            }
        }
    }
}

fn append_if_not_exists(fields: &mut JsonMap, prop: &str, items: &Value) {
    let new_items = to_items(items);
    if new_items.is_empty() {
        return;
    }
    if let Some(existing) = target_array(fields, prop, true) {
        for item in new_items {
            let duplicate = existing.iter().any(|present| match name_of(&item) {
                Some(name) => name_of(present) == Some(name),
                None => *present == item,
            });
            if !duplicate {
                existing.push(item);
            }
        }
    }
}

fn rename_arr(fields: &mut JsonMap, prop: &str, rename: &RenameSpec) {
    if rename.name.is_empty() {
        return;
    }
    if let Some(items) = target_array(fields, prop, false) {
        for entry in items.iter_mut() {
            if name_of(entry) != Some(rename.name.as_str()) {
                continue;
            }
            match entry {
                Value::String(s) => *s = rename.with.clone(),
                Value::Object(obj) => {
                    obj.insert("name".to_string(), Value::String(rename.with.clone()));
                }
                _ => {}
            }
            // First match only.
            break;
        }
    }
}

fn replace_arr(fields: &mut JsonMap, prop: &str, replace: &Value, items: &Value) {
    let new_items = to_items(items);
    if let Some(existing) = target_array(fields, prop, false) {
        let index = existing.iter().position(|entry| match replace {
            Value::String(name) => {
                name_of(entry) == Some(name.as_str()) || entry == replace
            }
            other => entry == other,
        });
        if let Some(index) = index {
            existing.splice(index..index + 1, new_items);
        } else {
            tracing::debug!(prop, ?replace, "replaceArr matched nothing, skipping");
        }
    }
}

fn replace_txt(fields: &mut JsonMap, prop: &str, pattern: &str, with: &str, flags: Option<&str>) {
    if pattern.is_empty() {
        return;
    }
    let case_insensitive = flags.map(|f| f.contains('i')).unwrap_or(false);
    let full_pattern = if case_insensitive {
        format!("(?i){pattern}")
    } else {
        pattern.to_string()
    };
    let regex = Regex::new(&full_pattern).ok();

    let rewrite = |text: &str| -> String {
        match &regex {
            Some(re) => re.replace_all(text, with).into_owned(),
            // Invalid pattern falls back to literal replacement.
            None => text.replace(pattern, with),
        }
    };

    fn walk(value: &mut Value, rewrite: &dyn Fn(&str) -> String) {
        match value {
            Value::String(s) => *s = rewrite(s),
            Value::Array(items) => {
                for item in items {
                    walk(item, rewrite);
                }
            }
            Value::Object(obj) => {
                for (_, v) in obj.iter_mut() {
                    walk(v, rewrite);
                }
            }
            _ => {}
        }
    }

    if let Some(value) = fields.get_mut(prop) {
        walk(value, &rewrite);
    }
}

// ============================================================================
// Root ops
// ============================================================================

fn add_senses(fields: &mut JsonMap, senses: &Value) {
    let additions: Vec<String> = to_items(senses)
        .into_iter()
        .filter_map(|sense| match sense {
            Value::String(s) => Some(s),
            Value::Object(obj) => {
                let kind = obj.get("type").and_then(Value::as_str)?;
                let range = obj.get("range").and_then(Value::as_i64)?;
                Some(format!("{kind} {range} ft."))
            }
            _ => None,
        })
        .collect();
    if additions.is_empty() {
        return;
    }
    if let Some(existing) = target_array(fields, "senses", true) {
        for sense in additions {
            let present = existing
                .iter()
                .any(|s| s.as_str() == Some(sense.as_str()));
            if !present {
                existing.push(Value::String(sense));
            }
        }
    }
}

fn add_skills(fields: &mut JsonMap, skills: &JsonMap) {
    if !fields.contains_key("skill") {
        fields.insert("skill".to_string(), Value::Object(JsonMap::new()));
    }
    let Some(Value::Object(existing)) = fields.get_mut("skill") else {
        tracing::debug!("skill property is not an object, skipping addSkills");
        return;
    };
    for (name, bonus) in skills {
        // Existing value wins on conflict.
        existing
            .entry(name.clone())
            .or_insert_with(|| bonus.clone());
    }
}

fn clamp_size(fields: &mut JsonMap, max: &str) {
    let max = SizeCode::from_code(max);
    if max == SizeCode::Unknown {
        return;
    }
    let Some(current) = fields.get("size") else { return };

    let was_string = current.is_string();
    let codes: Vec<SizeCode> = match current {
        Value::String(code) => vec![SizeCode::from_code(code)],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(SizeCode::from_code)
            .collect(),
        _ => return,
    };

    let mut clamped: Vec<SizeCode> = codes.iter().copied().filter(|c| *c <= max).collect();
    if clamped.is_empty() {
        // Every candidate exceeds the max: replace wholesale.
        clamped.push(max);
    }

    let replacement = if was_string && clamped.len() == 1 {
        Value::String(clamped[0].code().to_string())
    } else {
        Value::Array(
            clamped
                .into_iter()
                .map(|c| Value::String(c.code().to_string()))
                .collect(),
        )
    };
    fields.insert("size".to_string(), replacement);
}

fn set_prop(fields: &mut JsonMap, path: &str, value: &Value) {
    if path.is_empty() {
        return;
    }
    let mut segments = path.split('.').peekable();
    let mut current = fields;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value.clone());
            return;
        }
        let next = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(JsonMap::new()));
        match next {
            Value::Object(obj) => current = obj,
            _ => {
                tracing::debug!(path, segment, "setProp path crosses a non-object, skipping");
                return;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn spec(value: serde_json::Value) -> ModSpec {
        serde_json::from_value(value).expect("valid mod spec")
    }

    // -------------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_single_and_list_forms() {
        let s = spec(json!({
            "action": {"mode": "removeArr", "names": "Bite"},
            "trait": [
                {"mode": "appendArr", "items": {"name": "Amphibious", "entries": ["x"]}},
                {"mode": "removeArr", "names": ["Keen Smell"]}
            ]
        }));
        assert_eq!(s.0.len(), 2);
        assert_eq!(s.0["action"].iter().count(), 1);
        assert_eq!(s.0["trait"].iter().count(), 2);
    }

    #[test]
    fn test_parse_unknown_mode_is_noop() {
        let s = spec(json!({"action": {"mode": "frobnicate", "stuff": 1}}));
        let ops: Vec<&Modification> = s.0["action"].iter().collect();
        assert_eq!(ops, vec![&Modification::Unknown]);

        let mut f = fields(json!({"name": "X", "action": [{"name": "Bite"}]}));
        apply_modifications(&mut f, &s);
        assert_eq!(f["action"].as_array().unwrap().len(), 1);
    }

    // -------------------------------------------------------------------------
    // Array ops
    // -------------------------------------------------------------------------

    #[test]
    fn test_remove_arr_by_name() {
        let mut f = fields(json!({
            "action": [{"name": "Bite"}, {"name": "Claw"}, {"name": "Tail"}]
        }));
        apply_modifications(
            &mut f,
            &spec(json!({"action": {"mode": "removeArr", "names": ["Bite", "Tail"]}})),
        );
        let names: Vec<&str> = f["action"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Claw"]);
    }

    #[test]
    fn test_remove_arr_bare_strings() {
        let mut f = fields(json!({"languages": ["Common", "Goblin"]}));
        apply_modifications(
            &mut f,
            &spec(json!({"languages": {"mode": "removeArr", "names": "Goblin"}})),
        );
        assert_eq!(f["languages"], json!(["Common"]));
    }

    #[test]
    fn test_append_and_prepend() {
        let mut f = fields(json!({"action": [{"name": "Bite"}]}));
        apply_modifications(
            &mut f,
            &spec(json!({
                "action": [
                    {"mode": "appendArr", "items": {"name": "Tail"}},
                    {"mode": "prependArr", "items": {"name": "Multiattack"}}
                ]
            })),
        );
        let names: Vec<&str> = f["action"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Multiattack", "Bite", "Tail"]);
    }

    #[test]
    fn test_append_auto_initializes() {
        let mut f = fields(json!({"name": "X"}));
        apply_modifications(
            &mut f,
            &spec(json!({"reaction": {"mode": "appendArr", "items": {"name": "Parry"}}})),
        );
        assert_eq!(f["reaction"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_append_if_not_exists_idempotent() {
        let mut f = fields(json!({"trait": [{"name": "Amphibious"}]}));
        let s = spec(json!({
            "trait": {"mode": "appendIfNotExistsArr", "items": [
                {"name": "Amphibious"},
                {"name": "Pack Tactics"}
            ]}
        }));
        apply_modifications(&mut f, &s);
        let after_once = f.clone();
        apply_modifications(&mut f, &s);
        assert_eq!(f, after_once);
        assert_eq!(f["trait"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_rename_arr_first_match_only() {
        let mut f = fields(json!({
            "action": [{"name": "Bite"}, {"name": "Bite"}]
        }));
        apply_modifications(
            &mut f,
            &spec(json!({
                "action": {"mode": "renameArr", "rename": {"name": "Bite", "with": "Fangs"}}
            })),
        );
        let names: Vec<&str> = f["action"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Fangs", "Bite"]);
    }

    #[test]
    fn test_replace_arr_by_name() {
        let mut f = fields(json!({
            "action": [{"name": "Bite", "entries": ["old"]}, {"name": "Claw"}]
        }));
        apply_modifications(
            &mut f,
            &spec(json!({
                "action": {
                    "mode": "replaceArr",
                    "replace": "Bite",
                    "items": {"name": "Gore", "entries": ["new"]}
                }
            })),
        );
        let names: Vec<&str> = f["action"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Gore", "Claw"]);
    }

    #[test]
    fn test_replace_txt_recursive() {
        let mut f = fields(json!({
            "trait": [{
                "name": "Spider Climb",
                "entries": [
                    "The wolf can climb.",
                    {"type": "list", "items": ["wolf fur", "wolf fang"]}
                ]
            }]
        }));
        apply_modifications(
            &mut f,
            &spec(json!({
                "trait": {"mode": "replaceTxt", "replace": "wolf", "with": "spider"}
            })),
        );
        let text = serde_json::to_string(&f["trait"]).unwrap();
        assert!(!text.contains("wolf"));
        assert!(text.contains("spider fur"));
        // Names are strings too; replaceTxt touches every string field.
        assert!(text.contains("Spider Climb"));
    }

    #[test]
    fn test_replace_txt_case_insensitive_flag() {
        let mut f = fields(json!({"trait": [{"name": "T", "entries": ["The Wolf and the wolf."]}]}));
        apply_modifications(
            &mut f,
            &spec(json!({
                "trait": {"mode": "replaceTxt", "replace": "wolf", "with": "bear", "flags": "i"}
            })),
        );
        assert_eq!(
            f["trait"][0]["entries"][0],
            json!("The bear and the bear.")
        );
    }

    #[test]
    fn test_replace_txt_invalid_pattern_is_literal() {
        let mut f = fields(json!({"trait": [{"name": "T", "entries": ["a (b c"]}]}));
        apply_modifications(
            &mut f,
            &spec(json!({
                "trait": {"mode": "replaceTxt", "replace": "(b", "with": "X"}
            })),
        );
        assert_eq!(f["trait"][0]["entries"][0], json!("a X c"));
    }

    #[test]
    fn test_set_prop_creates_intermediates() {
        let mut f = fields(json!({"name": "X"}));
        apply_modifications(
            &mut f,
            &spec(json!({"speed": {"mode": "setProp", "prop": "speed.fly", "value": 60}})),
        );
        assert_eq!(f["speed"]["fly"], json!(60));
    }

    #[test]
    fn test_inapplicable_op_is_noop() {
        let mut f = fields(json!({"name": "X", "hp": 10}));
        let before = f.clone();
        // removeArr against a number-valued property: skipped.
        apply_modifications(
            &mut f,
            &spec(json!({"hp": {"mode": "removeArr", "names": "Bite"}})),
        );
        assert_eq!(f, before);
    }

    // -------------------------------------------------------------------------
    // Root ops
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_senses_formats_and_dedups() {
        let mut f = fields(json!({"senses": ["darkvision 60 ft."]}));
        let s = spec(json!({
            "_": {"mode": "addSenses", "senses": [
                {"type": "blindsight", "range": 30},
                "darkvision 60 ft."
            ]}
        }));
        apply_modifications(&mut f, &s);
        assert_eq!(
            f["senses"],
            json!(["darkvision 60 ft.", "blindsight 30 ft."])
        );
        // Applying again adds nothing.
        apply_modifications(&mut f, &s);
        assert_eq!(f["senses"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_add_skills_existing_wins() {
        let mut f = fields(json!({"skill": {"perception": "+5"}}));
        apply_modifications(
            &mut f,
            &spec(json!({
                "_": {"mode": "addSkills", "skills": {"perception": "+2", "stealth": "+4"}}
            })),
        );
        assert_eq!(f["skill"]["perception"], json!("+5"));
        assert_eq!(f["skill"]["stealth"], json!("+4"));
    }

    #[test]
    fn test_max_size_clamps_list() {
        let mut f = fields(json!({"size": ["M", "L", "H"]}));
        apply_modifications(
            &mut f,
            &spec(json!({"_": {"mode": "maxSize", "max": "L"}})),
        );
        assert_eq!(f["size"], json!(["M", "L"]));
    }

    #[test]
    fn test_max_size_replaces_wholesale_when_all_exceed() {
        let mut f = fields(json!({"size": ["H", "G"]}));
        apply_modifications(
            &mut f,
            &spec(json!({"_": {"mode": "maxSize", "max": "M"}})),
        );
        assert_eq!(f["size"], json!(["M"]));
    }

    #[test]
    fn test_max_size_keeps_string_shape() {
        let mut f = fields(json!({"size": "G"}));
        apply_modifications(
            &mut f,
            &spec(json!({"_": {"mode": "maxSize", "max": "L"}})),
        );
        assert_eq!(f["size"], json!("L"));
    }
}
