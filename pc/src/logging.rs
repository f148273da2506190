//! Tracing initialization for host applications
//!
//! The engine itself only emits `tracing` spans and events; hosts decide how
//! they are rendered. This helper installs a sensible fmt subscriber with
//! `RUST_LOG`-style filtering for hosts that do not bring their own.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a fmt subscriber filtered at `info` unless `RUST_LOG` says
/// otherwise
pub fn init() -> eyre::Result<()> {
    init_with_directives("info")
}

/// Install a fmt subscriber with explicit default filter directives
///
/// `RUST_LOG` still wins when set. Fails if a global subscriber is already
/// installed.
pub fn init_with_directives(directives: &str) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|e| eyre::eyre!("failed to install tracing subscriber: {e}"))
}
