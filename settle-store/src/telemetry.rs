//! Tracing Setup
//!
//! Wires the global `tracing` subscriber for binaries and test harnesses
//! embedding the service. Installation is idempotent: the first caller
//! wins and later calls leave the installed subscriber in place.

use tracing_subscriber::EnvFilter;

/// Output format for the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output for development and tests
    Pretty,
    /// Single-line JSON for production log shipping
    Json,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives applied when `RUST_LOG` is unset
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl LogConfig {
    /// Settlement crates at debug, everything else at info, pretty output
    pub fn development() -> Self {
        Self {
            filter: "info,settle_core=debug,settle_store=debug".to_string(),
            format: LogFormat::Pretty,
        }
    }

    /// Info across the board, JSON output
    pub fn production() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured filter when set. Returns `false`
/// when a subscriber is already installed; the earlier configuration stays
/// in effect.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_development() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.filter.contains("settle_core=debug"));
        assert!(config.filter.contains("settle_store=debug"));
    }

    #[test]
    fn test_production_config_ships_json() {
        assert_eq!(LogConfig::production().format, LogFormat::Json);
    }

    #[test]
    fn test_repeated_init_keeps_first_subscriber() {
        init_logging(&LogConfig::default());
        assert!(!init_logging(&LogConfig::default()));
    }
}
