//! Core modules for the bestiary pipeline.

pub mod bestiary;
pub mod logging;
