//! Opt-in log output for binaries built on this crate.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber. `RUST_LOG` selects what is printed and
/// defaults to `info`.
///
/// Fails if a global subscriber is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}
