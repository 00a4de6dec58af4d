//! Log output setup

use crate::manifest::LogConfig;
use anyhow::{Context as _, Result};
use std::io;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Install a global subscriber writing to stderr
///
/// `RUST_LOG` takes precedence over the configured level. Returns whether the subscriber was
/// installed; `false` means another one was already in place, which is left untouched.
///
/// # Errors
///
/// Fails if the configured level is not a valid filter directive.
pub fn init_logging(config: &LogConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    };
    Ok(installed)
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level in bundle.toml: {}", config.level))
}
