//! Orchestrator limits.

use derive_getters::Getters;
use scriptorium_core::{DEFAULT_MAX_VARIANT_COUNT, DEFAULT_VARIANT_COUNT};
use scriptorium_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied by the [`Pipeline`](crate::Pipeline).
///
/// ```toml
/// [pipeline]
/// generation_timeout_ms = 30000
/// max_variant_count = 26
/// default_variant_count = 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PipelineConfig {
    /// Time allowed for the builder to produce all variants
    #[serde(default = "default_generation_timeout_ms")]
    generation_timeout_ms: u64,
    /// Largest accepted `variantCount`
    #[serde(default = "default_max_variant_count")]
    max_variant_count: u32,
    /// `variantCount` applied when a request omits it
    #[serde(default = "default_variant_count")]
    default_variant_count: u32,
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_max_variant_count() -> u32 {
    DEFAULT_MAX_VARIANT_COUNT
}

fn default_variant_count() -> u32 {
    DEFAULT_VARIANT_COUNT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: default_generation_timeout_ms(),
            max_variant_count: default_max_variant_count(),
            default_variant_count: default_variant_count(),
        }
    }
}

impl PipelineConfig {
    /// Set the generation timeout.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the largest accepted variant count.
    pub fn with_max_variant_count(mut self, max: u32) -> Self {
        self.max_variant_count = max;
        self
    }

    /// Generation timeout as a [`Duration`].
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    /// Checks that the limits are usable.
    ///
    /// # Errors
    ///
    /// The timeout and maximum must be non-zero, and the default variant count
    /// must lie within `1..=max_variant_count`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation_timeout_ms == 0 {
            return Err(ConfigError::new(
                "pipeline.generation_timeout_ms must be greater than zero",
            ));
        }
        if self.max_variant_count == 0 {
            return Err(ConfigError::new(
                "pipeline.max_variant_count must be greater than zero",
            ));
        }
        if !(1..=self.max_variant_count).contains(&self.default_variant_count) {
            return Err(ConfigError::new(format!(
                "pipeline.default_variant_count must be within 1..={}, got {}",
                self.max_variant_count, self.default_variant_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let config: PipelineConfig = toml::from_str("max_variant_count = 5").expect("valid toml");
        assert_eq!(*config.max_variant_count(), 5);
        assert_eq!(config.generation_timeout(), Duration::from_secs(30));
        assert_eq!(*config.default_variant_count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_default_above_maximum() {
        let config: PipelineConfig =
            toml::from_str("max_variant_count = 2\ndefault_variant_count = 3").expect("valid toml");
        assert!(config.validate().is_err());

        let zero: PipelineConfig =
            toml::from_str("generation_timeout_ms = 0").expect("valid toml");
        assert!(zero.validate().is_err());
    }

    #[test]
    fn huge_timeouts_saturate() {
        assert_eq!(saturating_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);

        let config = PipelineConfig::default().with_generation_timeout(Duration::MAX);
        assert_eq!(*config.generation_timeout_ms(), u64::MAX);
    }
}
