//! Template Resolution Engine.
//!
//! Resolves the `_copy` inheritance language and `_versions` variant
//! forks into concrete creature records:
//!
//! - [`resolve_copy`]: fetches the `_copy` base through the lookup
//!   collaborator, applies named templates in order, then deep-merges the
//!   override record on top
//! - [`resolve_variants`]: expands a record's declared forks into
//!   independent sibling records
//! - [`select_variant`]: picks one fork by name
//! - [`resolve_and_render`]: the single entry point composing resolution,
//!   normalization, and rendering
//!
//! # Merge Semantics
//!
//! - **Primitives**: override replaces base outright
//! - **Arrays**: concatenated base-then-override, not deduplicated —
//!   "add more of the same kind" (an override that both inherits and
//!   redeclares a feature gets both; preserved as observed behavior)
//! - **Objects**: shallow-merged key by key, override wins
//! - **Reserved keys**: underscore-prefixed override keys are skipped,
//!   except `_copy` and `_versions`, which pass through so downstream
//!   variant expansion still sees them
//!
//! Missing bases and templates are logged and skipped — partial data
//! beats no data. Resolution holds no session state: variant selection
//! is supplied by the caller on each request.

use async_trait::async_trait;
use serde_json::Value;

use super::error::{BestiaryError, Result};
use super::modify::{apply_modifications, ModSpec};
use super::render::{render, RenderOptions, RenderOutput};
use super::types::{
    CreatureRecord, JsonMap, Template, KEY_COPY, KEY_IS_VARIANT, KEY_VARIANT_TEMPLATE,
    KEY_VERSIONS,
};

// ============================================================================
// Constants
// ============================================================================

/// Maximum `_copy` chain depth.
///
/// Prevents infinite loops when records reference each other cyclically.
const MAX_COPY_DEPTH: usize = 10;

// ============================================================================
// Lookup collaborators
// ============================================================================

/// External record lookup, used for `_copy` base resolution.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Find a creature record by name + source.
    async fn find(&self, name: &str, source: &str) -> Option<CreatureRecord>;
}

/// External template lookup, used during copy resolution.
#[async_trait]
pub trait TemplateLookup: Send + Sync {
    /// Find a named template by name + source.
    async fn find_template(&self, name: &str, source: &str) -> Option<Template>;
}

// ============================================================================
// Copy resolution
// ============================================================================

/// Resolve a record's `_copy` reference into a full record.
///
/// Returns the record unchanged when it carries no `_copy`. A missing
/// base record or template is non-fatal: the resolution proceeds with
/// whatever data is available, logging a warning.
pub async fn resolve_copy(
    record: &CreatureRecord,
    records: &dyn RecordLookup,
    templates: &dyn TemplateLookup,
) -> CreatureRecord {
    if record.copy_ref().is_none() {
        return record.clone();
    }

    // Walk the inheritance chain override → base → base-of-base, bounded.
    let mut chain: Vec<CreatureRecord> = vec![record.clone()];
    loop {
        let Some(copy) = chain.last().and_then(|r| r.copy_ref()) else {
            break;
        };
        if chain.len() > MAX_COPY_DEPTH {
            tracing::warn!(
                record = record.name(),
                depth = chain.len(),
                "copy chain exceeds depth limit, truncating"
            );
            break;
        }
        match records.find(&copy.name, &copy.source).await {
            Some(base) => {
                // A base that references itself (or an ancestor) would loop.
                if chain
                    .iter()
                    .any(|r| r.name() == base.name() && r.source() == base.source())
                {
                    tracing::warn!(
                        record = record.name(),
                        base = base.name(),
                        "circular copy reference, truncating chain"
                    );
                    break;
                }
                chain.push(base);
            }
            None => {
                tracing::warn!(
                    record = record.name(),
                    base = copy.name.as_str(),
                    source = copy.source.as_str(),
                    "copy base not found, proceeding with override data only"
                );
                break;
            }
        }
    }

    // Single-link chain means the base was never found.
    if chain.len() == 1 {
        return record.clone();
    }

    // Fold from the deepest ancestor down: templates, merge, then the
    // overlay's own _mod block.
    let mut working = chain.pop().expect("chain is non-empty");
    while let Some(overlay) = chain.pop() {
        if let Some(copy) = overlay.copy_ref() {
            for template_ref in &copy.templates {
                match templates
                    .find_template(&template_ref.name, &template_ref.source)
                    .await
                {
                    Some(template) => apply_template(&mut working.fields, &template),
                    None => {
                        tracing::warn!(
                            record = overlay.name(),
                            template = template_ref.name.as_str(),
                            source = template_ref.source.as_str(),
                            "template not found, skipping"
                        );
                    }
                }
            }
            merge_fields(&mut working.fields, &overlay.fields);
            if let Some(mods) = &copy.modifications {
                apply_modifications(&mut working.fields, mods);
            }
        } else {
            merge_fields(&mut working.fields, &overlay.fields);
        }
    }
    working
}

/// Apply one template: merge `_root` fields directly, then run `_mod`.
fn apply_template(fields: &mut JsonMap, template: &Template) {
    if let Some(root) = &template.apply.root {
        for (key, value) in root {
            fields.insert(key.clone(), value.clone());
        }
    }
    if let Some(mods) = &template.apply.modifications {
        apply_modifications(fields, mods);
    }
}

/// Deep-merge override fields into base fields, override taking precedence.
fn merge_fields(base: &mut JsonMap, override_fields: &JsonMap) {
    for (key, value) in override_fields {
        if key.starts_with('_') && key != KEY_COPY && key != KEY_VERSIONS {
            continue;
        }
        match (base.get_mut(key), value) {
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                existing.extend(incoming.iter().cloned());
            }
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (k, v) in incoming {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

// ============================================================================
// Variant expansion
// ============================================================================

/// Expand a record's `_versions` forks into independent sibling records.
///
/// The base record (with `_versions` stripped) comes first unless it is
/// marked template-only; variants follow in declaration order. Each
/// member is a deep copy — sibling modifications never leak. Duplicate
/// or unnamed variant specs are skipped.
pub fn resolve_variants(record: &CreatureRecord) -> Vec<CreatureRecord> {
    let Some(specs) = record.versions().cloned() else {
        return vec![record.clone()];
    };

    let mut members: Vec<CreatureRecord> = Vec::new();
    if !record.is_variant_template() {
        let mut base = record.clone();
        base.fields.shift_remove(KEY_VERSIONS);
        members.push(base);
    }

    for spec in &specs {
        let Some(spec) = spec.as_object() else {
            tracing::warn!(record = record.name(), "non-object variant spec, skipping");
            continue;
        };
        let Some(variant_name) = spec.get("name").and_then(Value::as_str) else {
            tracing::warn!(record = record.name(), "unnamed variant spec, skipping");
            continue;
        };
        if members.iter().any(|m| m.name() == variant_name) {
            tracing::warn!(
                record = record.name(),
                variant = variant_name,
                "duplicate variant name, skipping"
            );
            continue;
        }

        let mut variant = record.clone();
        variant.fields.shift_remove(KEY_VERSIONS);
        variant.fields.shift_remove(KEY_VARIANT_TEMPLATE);

        if let Some(mods) = spec.get("_mod") {
            match serde_json::from_value::<ModSpec>(mods.clone()) {
                Ok(mods) => apply_modifications(&mut variant.fields, &mods),
                Err(e) => {
                    tracing::warn!(
                        record = record.name(),
                        variant = variant_name,
                        error = %e,
                        "malformed variant _mod block, skipping ops"
                    );
                }
            }
        }

        // Remaining direct fields overwrite outright.
        for (key, value) in spec {
            if key == "_mod" || key.starts_with('_') {
                continue;
            }
            variant.fields.insert(key.clone(), value.clone());
        }
        variant.set(KEY_IS_VARIANT, Value::Bool(true));
        members.push(variant);
    }

    members
}

/// Variant names in membership order (base first when included).
pub fn variant_names(record: &CreatureRecord) -> Vec<String> {
    resolve_variants(record)
        .iter()
        .map(|r| r.name().to_string())
        .collect()
}

/// Select one fork by name.
pub fn select_variant(record: &CreatureRecord, name: &str) -> Result<CreatureRecord> {
    let members = resolve_variants(record);
    members
        .iter()
        .find(|m| m.name().eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| BestiaryError::UnknownVariant {
            requested: name.to_string(),
            available: members.iter().map(|m| m.name().to_string()).collect(),
        })
}

// ============================================================================
// Entry point
// ============================================================================

/// Resolve a record's copy reference and variant forks, normalize it, and
/// render the stat block — the single call surrounding code needs.
///
/// Returns a fork-selection document when the record has unresolved
/// variants and no selection was supplied; that is routine control flow,
/// not an error. An unknown requested variant is the one caller-facing
/// error.
pub async fn resolve_and_render(
    record: &CreatureRecord,
    records: &dyn RecordLookup,
    templates: &dyn TemplateLookup,
    options: &RenderOptions,
) -> Result<RenderOutput> {
    let resolved = resolve_copy(record, records, templates).await;
    render(&resolved, options)
}

// ============================================================================
// Tests
// ============================================================================
