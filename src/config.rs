//! Runtime configuration.
//!
//! Settings are read from a TOML document; every key is optional and
//! unknown keys are rejected so typos surface instead of being ignored.
//!
//! ```toml
//! default_step_timeout_ms = 5000
//! warn_on_timeout = true
//!
//! [log]
//! level = "debug"
//! ansi = false
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::Level;

use crate::error::ConfigError;

/// Settings consulted by the [`StepRunner`](crate::runner::StepRunner).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Advisory timeout for steps that do not declare their own.
    pub default_step_timeout_ms: Option<u64>,
    /// Emit a warning when a step runs longer than its timeout.
    pub warn_on_timeout: bool,
    /// Subscriber settings used by [`crate::logging::init`].
    pub log: LogConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_step_timeout_ms: None,
            warn_on_timeout: true,
            log: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, wrongly typed
    /// values or unknown keys.
    ///
    /// # Examples
    /// ```rust
    /// use std::time::Duration;
    /// use stepbind::config::RuntimeConfig;
    ///
    /// let config = RuntimeConfig::from_toml_str("default_step_timeout_ms = 250").unwrap();
    /// assert_eq!(config.default_step_timeout(), Some(Duration::from_millis(250)));
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The default advisory step timeout.
    #[must_use]
    pub fn default_step_timeout(&self) -> Option<Duration> {
        self.default_step_timeout_ms.map(Duration::from_millis)
    }
}

/// Log subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Maximum level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Colourise output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            ansi: false,
        }
    }
}

impl LogConfig {
    /// The configured level as a [`tracing::Level`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LogLevel`] when the text names no level.
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.level.trim()).map_err(|_| ConfigError::LogLevel {
            level: self.level.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_document_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").expect("parse");
        assert_eq!(config, RuntimeConfig::default());
        assert!(config.warn_on_timeout);
        assert_eq!(config.default_step_timeout(), None);
    }

    #[rstest]
    #[case("trace", Level::TRACE)]
    #[case("DEBUG", Level::DEBUG)]
    #[case(" info ", Level::INFO)]
    #[case("warn", Level::WARN)]
    #[case("error", Level::ERROR)]
    fn parses_log_levels(#[case] text: &str, #[case] expected: Level) {
        let log = LogConfig {
            level: text.to_owned(),
            ansi: false,
        };
        assert_eq!(log.level().expect("level"), expected);
    }

    #[rstest]
    fn rejects_unknown_level() {
        let log = LogConfig {
            level: "loud".to_owned(),
            ansi: false,
        };
        let err = log.level().expect_err("unknown level");
        assert!(matches!(err, ConfigError::LogLevel { ref level } if level == "loud"));
    }

    #[rstest]
    #[case::top_level("default_timeout = 5")]
    #[case::log_table("[log]\ncolour = true")]
    fn rejects_unknown_keys(#[case] text: &str) {
        let err = RuntimeConfig::from_toml_str(text).expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
