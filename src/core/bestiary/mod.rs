//! Bestiary Pipeline for Bestiarium
//!
//! The core transform pipeline: raw creature record → resolved record →
//! rendered stat block. The source JSON dialect encodes the same
//! semantic value in many shapes and lets one record be defined as a
//! structural transform of another, so resolution combines a
//! per-field normalizer, a patch-op interpreter, and a copy/variant
//! resolution engine.
//!
//! # Overview
//!
//! This module provides:
//!
//! - **Core Data Models**: [`CreatureRecord`], [`Template`], [`Feature`], [`SizeCode`]
//! - **Markup Expansion**: `{@tag args}` directives to display text
//! - **Field Normalization**: every dialect shape to one canonical shape per field
//! - **Modification Interpreter**: the declarative patch-op language
//! - **Copy/Variant Resolution**: `_copy` inheritance and `_versions` forks
//! - **Stat Block Rendering**: the structured display document
//!
//! # Architecture
//!
//! ```text
//!   raw record
//!       |
//!       v
//!   +--------------------+     RecordLookup / TemplateLookup
//!   | resolve_copy       |<--- (external collaborators)
//!   +--------------------+
//!       |
//!       v
//!   +--------------------+     no selection -> ForkSelectionDocument
//!   | resolve_variants   |
//!   +--------------------+
//!       |
//!       v
//!   +--------------------+     +--------------------+
//!   | normalize          |---->| render             |--> StatBlockDocument
//!   +--------------------+     +--------------------+
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use bestiarium::core::bestiary::{resolve_and_render, InMemoryBestiary, RenderOptions};
//!
//! let store = InMemoryBestiary::new();
//! store.load_file("bestiary.json").await?;
//!
//! let record = store.get("Goblin Boss", Some("MM")).await.unwrap();
//! let output = resolve_and_render(&record, &store, &store, &RenderOptions::new()).await?;
//! ```

pub mod error;
pub mod markup;
pub mod modify;
pub mod normalize;
pub mod render;
pub mod resolve;
pub mod store;
pub mod types;

pub use error::{BestiaryError, Result};
pub use markup::{expand, MarkupContext};
pub use modify::{apply_modifications, ModSpec, Modification};
pub use normalize::{normalize, NormalizedCreature};
pub use render::{
    ForkSelectionDocument, RenderOptions, RenderOutput, StatBlockDocument,
};
pub use resolve::{
    resolve_and_render, resolve_copy, resolve_variants, select_variant, RecordLookup,
    TemplateLookup,
};
pub use store::InMemoryBestiary;
pub use types::{CreatureRecord, Entry, Feature, SizeCode, Template};
