//! In-Memory Bestiary Store.
//!
//! The storage collaborator behind the lookup seams: a simple key-value
//! store of creature records and templates keyed by (name, source),
//! loaded from bestiary JSON files. Records are held read-only and
//! returned by clone — the pipeline computes a resolved, normalized copy
//! on demand and never mutates stored data.
//!
//! # Thread Safety
//!
//! All state is behind `tokio::sync::RwLock` for async-safe access.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::error::Result;
use super::resolve::{RecordLookup, TemplateLookup};
use super::types::{CreatureRecord, Template};

/// Case-insensitive (name, source) key.
fn key(name: &str, source: &str) -> (String, String) {
    (name.to_lowercase(), source.to_lowercase())
}

/// In-memory bestiary backed by dialect JSON files.
///
/// A bestiary file is an object with a `monster` array of creature
/// records and an optional `monsterTemplate` array of templates.
#[derive(Default)]
pub struct InMemoryBestiary {
    records: Arc<RwLock<HashMap<(String, String), CreatureRecord>>>,
    templates: Arc<RwLock<HashMap<(String, String), Template>>>,
}

impl InMemoryBestiary {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a bestiary file, returning how many records were added.
    ///
    /// Records that fail structural validation are logged and skipped —
    /// the store contains whatever loaded successfully.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        let count = self.load_value(&value).await;
        log::info!("Loaded {count} records from {}", path.display());
        Ok(count)
    }

    /// Load records and templates from an already-parsed bestiary value.
    pub async fn load_value(&self, value: &Value) -> usize {
        let mut count = 0;

        if let Some(monsters) = value.get("monster").and_then(Value::as_array) {
            for entry in monsters {
                let Some(record) = CreatureRecord::from_value(entry.clone()) else {
                    log::warn!("Skipping non-object monster entry");
                    continue;
                };
                if let Err(e) = record.validate() {
                    log::warn!("Skipping record: {e}");
                    continue;
                }
                self.insert(record).await;
                count += 1;
            }
        }

        if let Some(templates) = value.get("monsterTemplate").and_then(Value::as_array) {
            for entry in templates {
                match serde_json::from_value::<Template>(entry.clone()) {
                    Ok(template) => self.insert_template(template).await,
                    Err(e) => log::warn!("Skipping malformed template: {e}"),
                }
            }
        }

        count
    }

    /// Insert a record, replacing any existing one with the same key.
    pub async fn insert(&self, record: CreatureRecord) {
        let mut records = self.records.write().await;
        records.insert(key(record.name(), record.source()), record);
    }

    /// Insert a template, replacing any existing one with the same key.
    pub async fn insert_template(&self, template: Template) {
        let mut templates = self.templates.write().await;
        templates.insert(key(&template.name, &template.source), template);
    }

    /// Fetch a record by name, optionally pinned to a source.
    ///
    /// Without a source (or when the exact key misses), falls back to a
    /// name-only scan — bestiary files rarely collide on name, and a
    /// near-miss beats nothing for interactive use.
    pub async fn get(&self, name: &str, source: Option<&str>) -> Option<CreatureRecord> {
        let records = self.records.read().await;
        if let Some(source) = source {
            if let Some(record) = records.get(&key(name, source)) {
                return Some(record.clone());
            }
        }
        let lowered = name.to_lowercase();
        records
            .iter()
            .find(|((n, _), _)| *n == lowered)
            .map(|(_, record)| record.clone())
    }

    /// All record names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let records = self.records.read().await;
        let mut names: Vec<String> = records.values().map(|r| r.name().to_string()).collect();
        names.sort();
        names
    }

    /// Number of stored records.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RecordLookup for InMemoryBestiary {
    async fn find(&self, name: &str, source: &str) -> Option<CreatureRecord> {
        self.get(name, Some(source)).await
    }
}

#[async_trait]
impl TemplateLookup for InMemoryBestiary {
    async fn find_template(&self, name: &str, source: &str) -> Option<Template> {
        let templates = self.templates.read().await;
        templates.get(&key(name, source)).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn bestiary_json() -> Value {
        json!({
            "monster": [
                {"name": "Goblin", "source": "MM", "ac": 15},
                {"name": "Wolf", "source": "MM", "ac": 13},
                {"source": "MM", "ac": 1},
                "not an object"
            ],
            "monsterTemplate": [
                {"name": "Ghostly", "source": "HB", "apply": {"_root": {"type": "undead"}}}
            ]
        })
    }

    #[tokio::test]
    async fn test_load_value_skips_invalid() {
        let store = InMemoryBestiary::new();
        let count = store.load_value(&bestiary_json()).await;
        assert_eq!(count, 2);
        assert_eq!(store.count().await, 2);
        assert_eq!(store.names().await, vec!["Goblin", "Wolf"]);
    }

    #[tokio::test]
    async fn test_lookup_case_insensitive() {
        let store = InMemoryBestiary::new();
        store.load_value(&bestiary_json()).await;
        assert!(store.get("goblin", Some("mm")).await.is_some());
        assert!(store.find("GOBLIN", "MM").await.is_some());
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_name_only() {
        let store = InMemoryBestiary::new();
        store.load_value(&bestiary_json()).await;
        let found = store.get("Wolf", Some("XGE")).await;
        assert_eq!(found.map(|r| r.source().to_string()), Some("MM".to_string()));
        assert!(store.get("Wolf", None).await.is_some());
        assert!(store.get("Dire Nothing", None).await.is_none());
    }

    #[tokio::test]
    async fn test_template_lookup() {
        let store = InMemoryBestiary::new();
        store.load_value(&bestiary_json()).await;
        let template = store.find_template("Ghostly", "HB").await.expect("template");
        assert_eq!(
            template.apply.root.as_ref().unwrap().get("type"),
            Some(&json!("undead"))
        );
        assert!(store.find_template("Nope", "HB").await.is_none());
    }

    #[tokio::test]
    async fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", bestiary_json()).unwrap();

        let store = InMemoryBestiary::new();
        let count = store.load_file(file.path()).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_load_file_bad_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let store = InMemoryBestiary::new();
        let err = store.load_file(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
