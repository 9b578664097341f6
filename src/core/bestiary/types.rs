//! Core data types for the bestiary pipeline.
//!
//! The central entity is [`CreatureRecord`]: a sparse, semi-structured
//! mapping of attribute names to polymorphic JSON values, loaded verbatim
//! from a bestiary file. Records stay in their raw JSON shape until the
//! normalizer coerces each field to its canonical form — the inheritance
//! and modification machinery operates on the raw shape deliberately, so
//! it can patch fields the normalizer knows nothing about.
//!
//! Also defined here:
//!
//! - [`CopyRef`] / [`TemplateRef`]: the `_copy` reference a record may
//!   carry, naming a base record and ordered template applications
//! - [`Template`]: a named, reusable bundle of root-field merges and
//!   modification ops
//! - [`Feature`] / [`Entry`]: named trait/action entries with one level
//!   of structured nesting
//! - [`SizeCode`]: the fixed size ordering used for sorting and the
//!   `maxSize` clamp

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::modify::ModSpec;

/// JSON object map, insertion-ordered (`serde_json` with `preserve_order`).
pub type JsonMap = serde_json::Map<String, Value>;

// ============================================================================
// CreatureRecord
// ============================================================================

/// Reserved key: reference to a base record plus optional templates.
pub const KEY_COPY: &str = "_copy";
/// Reserved key: ordered list of variant fork specs.
pub const KEY_VERSIONS: &str = "_versions";
/// Reserved key: marks a record that exists only to be forked.
pub const KEY_VARIANT_TEMPLATE: &str = "_isVariantTemplate";
/// Reserved key: marks an expanded variant record.
pub const KEY_IS_VARIANT: &str = "_isVariant";

/// One creature's raw or resolved attribute mapping.
///
/// A thin wrapper over an ordered JSON object. Field access goes through
/// accessors so reserved-key handling stays in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureRecord {
    pub fields: JsonMap,
}

impl CreatureRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing JSON object.
    pub fn from_fields(fields: JsonMap) -> Self {
        Self { fields }
    }

    /// Parse a record from an arbitrary JSON value.
    ///
    /// Returns `None` if the value is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// The record's display name ("" if absent — callers that require a
    /// name validate at load time).
    pub fn name(&self) -> &str {
        self.fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The record's source abbreviation ("" if absent).
    pub fn source(&self) -> &str {
        self.fields
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a raw field.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Parse this record's `_copy` reference, if any.
    ///
    /// A malformed `_copy` value is treated as absent (logged by the
    /// resolution engine when it matters).
    pub fn copy_ref(&self) -> Option<CopyRef> {
        let value = self.fields.get(KEY_COPY)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// The record's raw `_versions` list, if any.
    pub fn versions(&self) -> Option<&Vec<Value>> {
        self.fields.get(KEY_VERSIONS).and_then(Value::as_array)
    }

    /// Whether this record has unresolved variant forks.
    pub fn has_versions(&self) -> bool {
        self.versions().map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Whether this record exists solely to be forked into variants and
    /// should never be shown standalone.
    pub fn is_variant_template(&self) -> bool {
        self.fields
            .get(KEY_VARIANT_TEMPLATE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether this record was produced by variant expansion.
    pub fn is_variant(&self) -> bool {
        self.fields
            .get(KEY_IS_VARIANT)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Validate structural requirements for a loadable record.
    pub fn validate(&self) -> super::error::Result<()> {
        if self.name().is_empty() {
            return Err(super::error::BestiaryError::MalformedRecord {
                reason: "record has no name".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Copy references and templates
// ============================================================================

/// A `_copy` reference: the base record to inherit from, optional named
/// templates applied to the base in order, and an optional modification
/// block applied after the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyRef {
    /// Name of the base record.
    pub name: String,
    /// Source abbreviation of the base record.
    pub source: String,
    /// Templates to apply to the base, in declaration order.
    #[serde(default, rename = "_templates")]
    pub templates: Vec<TemplateRef>,
    /// Modifications to run after the base/override merge.
    #[serde(default, rename = "_mod")]
    pub modifications: Option<ModSpec>,
}

/// Reference to a named template by name + source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    pub source: String,
}

/// A named, reusable bundle of field merges and modification ops applied
/// during copy resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub apply: TemplateApply,
}

/// What a template does when applied: merge `_root` fields directly into
/// the working record, then run `_mod` through the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateApply {
    #[serde(default, rename = "_root")]
    pub root: Option<JsonMap>,
    #[serde(default, rename = "_mod")]
    pub modifications: Option<ModSpec>,
}

// ============================================================================
// Features and entries
// ============================================================================

/// A named entry in a trait/action/reaction/legendary list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// One entry of a feature: plain text (possibly containing markup
/// directives), a list, or one level of named nesting. Shapes the
/// renderer doesn't understand are preserved but render as nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Text(String),
    List {
        #[serde(rename = "type")]
        kind: String,
        items: Vec<Entry>,
    },
    Named {
        name: String,
        entries: Vec<Entry>,
    },
    Other(Value),
}

// ============================================================================
// SizeCode
// ============================================================================

/// Creature size with the fixed total order used for range filters and
/// the `maxSize` clamp. Unknown codes sort last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SizeCode {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Gargantuan,
    Unknown,
}

impl SizeCode {
    /// Parse a single-letter size code.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "T" => SizeCode::Tiny,
            "S" => SizeCode::Small,
            "M" => SizeCode::Medium,
            "L" => SizeCode::Large,
            "H" => SizeCode::Huge,
            "G" => SizeCode::Gargantuan,
            _ => SizeCode::Unknown,
        }
    }

    /// The single-letter code ("?" for unknown).
    pub fn code(&self) -> &'static str {
        match self {
            SizeCode::Tiny => "T",
            SizeCode::Small => "S",
            SizeCode::Medium => "M",
            SizeCode::Large => "L",
            SizeCode::Huge => "H",
            SizeCode::Gargantuan => "G",
            SizeCode::Unknown => "?",
        }
    }

    /// Display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SizeCode::Tiny => "Tiny",
            SizeCode::Small => "Small",
            SizeCode::Medium => "Medium",
            SizeCode::Large => "Large",
            SizeCode::Huge => "Huge",
            SizeCode::Gargantuan => "Gargantuan",
            SizeCode::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for SizeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Tests
// ============================================================================
