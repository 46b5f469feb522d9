//! Tracing subscriber setup.
//!
//! Logs go to standard error because DevPod reads command results such as
//! the workspace status from standard output.

use std::env;
use std::io;
use std::str::FromStr;

use thiserror::Error;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable DevPod uses to pass its own log level.
pub const DEVPOD_LOG_LEVEL: &str = "DEVPOD_LOG_LEVEL";

const DEFAULT_FILTER: &str = "info";

/// Raised when a global subscriber is already installed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("failed to initialise logging: {0}")]
pub struct LoggingError(String);

/// Installs the global subscriber.
///
/// The level comes from `DEVPOD_LOG_LEVEL` when it holds a valid level,
/// otherwise from `RUST_LOG`, otherwise `info`. An invalid
/// `DEVPOD_LOG_LEVEL` is reported once logging is up.
///
/// # Errors
///
/// Returns [`LoggingError`] when a subscriber has already been installed.
pub fn init() -> Result<(), LoggingError> {
    let devpod_level = env::var(DEVPOD_LOG_LEVEL).ok().filter(|value| !value.is_empty());
    let parsed = devpod_level.as_deref().map(parse_level);

    let filter = match parsed {
        Some(Some(level)) => EnvFilter::default().add_directive(level.into()),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()
        .map_err(|err| LoggingError(err.to_string()))?;

    if let (Some(value), Some(None)) = (devpod_level, parsed) {
        error!(level = %value, "invalid log level provided, continuing");
    }
    Ok(())
}

/// Parses a DevPod log level, accepting the logrus spellings DevPod uses.
#[must_use]
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::WARN),
        "fatal" | "panic" => Some(LevelFilter::ERROR),
        other => LevelFilter::from_str(other).ok(),
    }
}
