//! Error types for the bestiary pipeline.
//!
//! Most failure modes in this pipeline are recovered locally and never
//! become errors: a field that matches no known shape falls back to its
//! documented default, a missing `_copy` base or template is logged and
//! skipped, and an inapplicable modification op is a silent no-op. Only
//! failures that require the caller's input (or happen before the
//! pipeline starts, at load time) surface through this enum.

use thiserror::Error;

/// Result type alias for bestiary operations.
pub type Result<T> = std::result::Result<T, BestiaryError>;

/// Error enum for bestiary resolution and loading.
#[derive(Error, Debug)]
pub enum BestiaryError {
    /// Caller requested a variant name that isn't among the record's forks.
    ///
    /// The `available` field lists the valid selections so the caller can
    /// present them without re-expanding the record.
    #[error("Unknown variant '{requested}', available: {available:?}")]
    UnknownVariant {
        /// The variant name the caller asked for
        requested: String,
        /// Variant names the record actually declares
        available: Vec<String>,
    },

    /// A record failed a structural requirement at load time
    /// (e.g. missing or empty `name`).
    #[error("Malformed record: {reason}")]
    MalformedRecord {
        /// Description of what made the record unusable
        reason: String,
    },

    /// A bestiary file could not be read.
    #[error("Failed to read bestiary file: {0}")]
    Io(#[from] std::io::Error),

    /// A bestiary file was not valid JSON.
    #[error("Failed to parse bestiary JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
