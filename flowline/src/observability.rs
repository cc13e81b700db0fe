//! Tracing setup for binaries and tests.
//!
//! Stage workers log through `tracing` spans created by their scope; this
//! module only wires a subscriber to see them.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber honoring `RUST_LOG`.
///
/// Falls back to `default_filter` when `RUST_LOG` is unset. Safe to call more
/// than once; later calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
