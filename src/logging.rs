//! Installation of the process-wide `tracing` subscriber.
//!
//! The crate only emits events; hosts that have no subscriber of their own
//! can call [`init`] once at startup.

use tracing_subscriber::fmt;

use crate::config::LogConfig;
use crate::error::ConfigError;

/// Install a formatting subscriber writing to stderr at the configured
/// level.
///
/// # Errors
///
/// Returns [`ConfigError::LogLevel`] for an unknown level and
/// [`ConfigError::Subscriber`] when a global subscriber is already set.
pub fn init(config: &LogConfig) -> Result<(), ConfigError> {
    let level = config.level()?;
    fmt()
        .with_max_level(level)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ConfigError::Subscriber {
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_is_rejected_before_installing() {
        let config = LogConfig {
            level: "chatty".to_owned(),
            ansi: false,
        };
        let err = init(&config).expect_err("invalid level");
        assert!(matches!(err, ConfigError::LogLevel { .. }));
    }
}
