//! Internal test suites.
//!
//! Property-based invariants live under `property/`; unit tests live in
//! `#[cfg(test)]` modules next to the code they exercise.

mod property;
