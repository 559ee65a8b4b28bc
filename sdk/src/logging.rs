//! Tracing setup for binaries and tests built on the SDK

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `level`. Safe to call more than once; only the first call installs.
pub fn init_tracing(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        // Another subscriber may already be global in tests
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
