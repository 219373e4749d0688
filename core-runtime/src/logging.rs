//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - Pretty, JSON, and compact output formats
//! - Module-level filtering via `RUST_LOG`-style directives
//!
//! ## Overview
//!
//! This module configures the `tracing-subscriber` stack used by the player
//! crates. Hosts embedding the core in an application that already installs a
//! global subscriber should skip `init_logging` entirely; everything in the
//! core logs through plain `tracing` macros and composes with whatever
//! subscriber is active.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_directives("core_player=debug,info");
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("Player starting");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::filter::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

/// Configuration for the logging stack.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directives (`RUST_LOG` syntax). The `RUST_LOG` environment
    /// variable, when set, takes precedence over this value.
    pub directives: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            directives: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Sets the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the default filter directives.
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = directives.into();
        self
    }
}

/// Initializes the global tracing subscriber.
///
/// # Errors
///
/// Returns [`Error::Config`] when the directives fail to parse or a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.directives))
        .map_err(|e| Error::Config(format!("Invalid log directives: {e}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    result.map_err(|e| Error::Config(format!("Failed to install subscriber: {e}")))?;

    tracing::debug!(format = ?config.format, "logging initialized");
    Ok(())
}
