//! Builder selection from configuration.

use crate::{BackendScriptBuilder, ChatClient, TemplateScriptBuilder};
use derive_getters::Getters;
use scriptorium_error::{ConfigError, ScriptoriumResult};
use scriptorium_interface::ScriptBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Which builder implementation to use.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BuilderKind {
    /// Deterministic templating (stub output)
    #[default]
    Template,
    /// OpenAI-compatible chat completion backend
    Backend,
}

/// Configuration for script generation.
///
/// # Example
///
/// ```toml
/// [generation]
/// builder = "backend"
/// base_url = "http://localhost:8080"
/// model = "mistral-7b"
/// temperature = 0.9
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GenerationConfig {
    /// Builder implementation
    #[serde(default)]
    builder: BuilderKind,
    /// Base URL of the chat completion backend
    #[serde(default = "default_base_url")]
    base_url: String,
    /// Model identifier sent to the backend
    #[serde(default)]
    model: Option<String>,
    /// Bearer token for the backend
    #[serde(default)]
    api_key: Option<String>,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    temperature: Option<f32>,
    /// Completion length cap
    #[serde(default)]
    max_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.8)
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            builder: BuilderKind::default(),
            base_url: default_base_url(),
            model: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl GenerationConfig {
    /// Configuration for the backend builder.
    pub fn backend(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            builder: BuilderKind::Backend,
            base_url: base_url.into(),
            model: Some(model.into()),
            ..Self::default()
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Checks that the selected builder has what it needs.
    ///
    /// # Errors
    ///
    /// The backend builder requires a non-empty `model` and an http(s) `base_url`;
    /// a temperature outside `[0, 2]` is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature.filter(|t| !(0.0..=2.0).contains(t)) {
            return Err(ConfigError::new(format!(
                "generation.temperature must be within [0, 2], got {}",
                t
            )));
        }
        if self.builder == BuilderKind::Backend {
            if self.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
                return Err(ConfigError::new(
                    "generation.model is required for the backend builder",
                ));
            }
            if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
                return Err(ConfigError::new(format!(
                    "generation.base_url must be an http(s) URL, got '{}'",
                    self.base_url
                )));
            }
        }
        Ok(())
    }
}

/// Create the builder selected by `config`, rejecting requests for more than
/// `max_variant_count` variants.
///
/// # Errors
///
/// Returns a configuration error if `config` fails validation or
/// `max_variant_count` is zero.
pub fn create_builder(
    config: &GenerationConfig,
    max_variant_count: u32,
) -> ScriptoriumResult<Arc<dyn ScriptBuilder>> {
    config.validate()?;
    if max_variant_count == 0 {
        return Err(ConfigError::new("max_variant_count must be greater than zero").into());
    }
    info!(builder = %config.builder, max_variant_count, "Creating script builder");

    let builder: Arc<dyn ScriptBuilder> = match config.builder {
        BuilderKind::Template => {
            Arc::new(TemplateScriptBuilder::new().with_max_variant_count(max_variant_count))
        }
        BuilderKind::Backend => {
            let model = config.model.clone().unwrap_or_default();
            let client = ChatClient::new(config.base_url.clone(), config.api_key.clone());
            Arc::new(
                BackendScriptBuilder::new(client, model)
                    .with_temperature(config.temperature)
                    .with_max_tokens(config.max_tokens)
                    .with_max_variant_count(max_variant_count),
            )
        }
    };
    Ok(builder)
}
