//! `gymops-observability` — process-wide tracing setup.
//!
//! The services log every state change (item created, sale recorded, order
//! transitioned, subscription renewed) through `tracing`; this crate only
//! wires the subscriber that renders those events as JSON lines.

use tracing_subscriber::EnvFilter;

/// Install the global JSON log subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Safe to call
/// from every test or binary entry point; only the first call installs,
/// later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
