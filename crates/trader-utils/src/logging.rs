//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
///
/// Honors `RUST_LOG`; falls back to `info`.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Initialize tracing with a custom fallback filter (e.g. `"warn,trade_assistant=info"`)
pub fn init_tracing_with_default(default_filter: &str) {
    // try_init so repeated calls (tests, embedded use) don't panic
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
