//! # Logging Setup
//!
//! Installs a tracing subscriber from a [`LoggingConfig`].
//!
//! The transport itself only emits `tracing` events; installing a
//! subscriber is left to the embedding process so that several transports
//! in one process can share (or skip) a single logging pipeline.
//! `RUST_LOG` overrides the configured default level.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a global subscriber for the configured level and format.
///
/// Repeated calls keep the first subscriber; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();

    if config.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .ok();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .ok();
    }
}
