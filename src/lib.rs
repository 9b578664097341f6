/// Bestiarium - Bestiary Normalizer & Stat Block Renderer
///
/// Core library providing creature record normalization, copy/template
/// resolution, variant expansion, and stat block rendering for 5e-style
/// bestiary JSON data.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
