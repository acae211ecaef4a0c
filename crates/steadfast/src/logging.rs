//! Logging setup.
//!
//! Steadfast emits `tracing` events: `debug` per poll and click attempt,
//! `info` per completed action, `warn` for best-effort steps that failed.
//! Test binaries that want to see them call [`init`] once.

use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive that overrides the level
pub const LOG_ENV: &str = "STEADFAST_LOG";

/// Log level for Steadfast output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// No output
    Silent,
    /// Errors only
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings and completed actions (default)
    #[default]
    Info,
    /// Everything, including each poll attempt
    Debug,
}

impl LogLevel {
    const fn as_filter(self) -> &'static str {
        match self {
            Self::Silent => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(Self::Silent),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(format!("Invalid log level: {other}")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Build the filter: `STEADFAST_LOG` if set and valid, else `level`
#[must_use]
pub fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Install a compact fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed, so repeated
/// calls from several tests are harmless.
pub fn init(level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().compact().with_test_writer())
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber, for CI log collection
pub fn init_json(level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().json())
        .try_init()
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Silent.to_string(), "off");
    }

    #[test]
    fn test_init_is_idempotent() {
        let _ = init(LogLevel::Debug);
        assert!(!init(LogLevel::Debug));
    }
}
