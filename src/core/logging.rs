//! Terminal Logging Module
//!
//! Sets up a `tracing` subscriber with an env-filtered stderr layer and
//! bridges the `log` facade into it, so both `tracing::` and `log::`
//! macros end up in the same place. Diagnostics go to stderr — stdout is
//! reserved for rendered stat blocks.

use std::io;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging for the CLI.
///
/// Filter defaults to `info` and is overridable via `RUST_LOG`.
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Route log:: macros through tracing.
    let _ = tracing_log::LogTracer::init();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
