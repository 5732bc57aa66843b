//! Log output bootstrap.

use derive_getters::Getters;
use scriptorium_error::ConfigError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// Log output configuration.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info", "scriptorium_pipeline=debug")
    #[serde(default = "default_level")]
    level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Checks that `level` is a valid filter directive.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the parse failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter().map(|_| ())
    }

    fn filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.level).map_err(|e| {
            ConfigError::new(format!("logging.level '{}' is invalid: {}", self.level, e))
        })
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns a configuration error if the filter is invalid or a global subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => config.filter()?,
    };

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install log subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_level() {
        let config: LoggingConfig =
            serde_json::from_value(serde_json::json!({"level": "scriptorium=notalevel"}))
                .expect("deserializes");
        assert!(config.validate().is_err());
        assert!(LoggingConfig::default().validate().is_ok());
    }
}
