//! Structured logging via **tracing**.
//!
//! The analysis leaves a trace-level trail of every classification and
//! decision (full uses, forward uses, association pruning, processing
//! steps), mirroring a compiler's verbose diagnostics stream. The JSON
//! subscriber provides machine-readable output for observability platforms.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing collector (subscriber).
///
/// This should be called *once* at the beginning of the application's
/// runtime. It configures structured JSON output to stderr. Without
/// `RUST_LOG` the filter defaults to `warn`, so stubbed-include and
/// config-load notices still surface.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=includecheck=trace`)
pub fn init_structured_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // keeps stdout clean for tool output
        .init();
}
