//! Tracing setup for the binary and for hosts embedding the crate.
//!
//! The library only emits `tracing` events. Installing a subscriber is
//! explicit and happens at most once per process.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::Error;

/// Log level definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Installs a compact stderr subscriber filtered at `level`.
///
/// `RUST_LOG` takes precedence when set. Returns `false` when a global
/// subscriber is already installed.
#[must_use]
pub fn init_logging(level: LogLevel) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}

/// Logs an [`Error`] at error level, prefixed with `context` when given.
pub fn log_error(error: &Error, context: Option<&str>) {
    let message = match context {
        Some(ctx) => format!("{ctx}: {error}"),
        None => error.to_string(),
    };
    tracing::error!("{message}");

    for warning in error.warnings() {
        tracing::warn!("{warning}");
    }
}

/// Result extension for convenient error logging.
pub trait ResultExt<T> {
    fn log_error(self, context: Option<&str>) -> Self;
}

impl<T> ResultExt<T> for Result<T, Error> {
    fn log_error(self, context: Option<&str>) -> Self {
        if let Err(ref error) = self {
            log_error(error, context);
        }
        self
    }
}
