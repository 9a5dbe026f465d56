//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

/// JSON logs to stdout (CloudWatch picks them up), filtered by `RUST_LOG`,
/// default `info`. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .with_current_span(false)
        .try_init();
}
