//! Layered server configuration.

use crate::LoggingConfig;
use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use scriptorium_error::{ConfigError, ScriptoriumError, ScriptoriumResult};
use scriptorium_generation::GenerationConfig;
use scriptorium_pipeline::PipelineConfig;
use scriptorium_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../scriptorium.toml");

/// Prefix for environment overrides, e.g. `SCRIPTORIUM__SERVER__BIND`.
const ENV_PREFIX: &str = "SCRIPTORIUM";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ServerConfig {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `bind` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|e| {
            ConfigError::new(format!("server.bind '{}' is not a socket address: {}", self.bind, e))
        })
    }
}

/// Known-project allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ProjectsConfig {
    /// Accepted project ids; empty accepts all
    #[serde(default)]
    known: Vec<String>,
}

/// Complete Scriptorium configuration.
///
/// Sources in increasing precedence:
/// 1. Bundled defaults (`scriptorium.toml` shipped with this crate)
/// 2. `~/.config/scriptorium/scriptorium.toml`
/// 3. `./scriptorium.toml`
/// 4. An explicit file passed to [`ScriptoriumConfig::load`]
/// 5. `SCRIPTORIUM__<SECTION>__<KEY>` environment variables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct ScriptoriumConfig {
    /// HTTP listener
    #[serde(default)]
    server: ServerConfig,
    /// Orchestrator limits
    #[serde(default)]
    pipeline: PipelineConfig,
    /// Builder selection
    #[serde(default)]
    generation: GenerationConfig,
    /// Store selection
    #[serde(default)]
    storage: StorageConfig,
    /// Project allow-list
    #[serde(default)]
    projects: ProjectsConfig,
    /// Log output
    #[serde(default)]
    logging: LoggingConfig,
}

impl ScriptoriumConfig {
    /// Load configuration from every layer.
    ///
    /// User config files are optional and silently skipped if missing; an
    /// explicit file must exist.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a source cannot be read or parsed, or if
    /// the merged configuration fails [`validate`](Self::validate).
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> ScriptoriumResult<Self> {
        debug!("Loading configuration: env > explicit > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/scriptorium/scriptorium.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("scriptorium").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("projects.known"),
        );

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Bundled defaults overlaid with `toml`, without touching the filesystem or
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `toml` does not parse or the result fails
    /// validation.
    pub fn from_toml_str(toml: &str) -> ScriptoriumResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Replace the listen address.
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.server.bind = bind.into();
        self
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first section's configuration error.
    pub fn validate(&self) -> Result<(), ScriptoriumError> {
        self.server.socket_addr()?;
        self.pipeline.validate()?;
        self.generation.validate()?;
        self.logging.validate()?;
        if self.projects.known.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::new("projects.known must not contain blank ids").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_generation::BuilderKind;
    use scriptorium_storage::StoreKind;

    #[test]
    fn bundled_defaults_parse_and_validate() {
        let config = ScriptoriumConfig::from_toml_str("").expect("defaults valid");
        assert_eq!(config.server().bind(), "127.0.0.1:8080");
        assert_eq!(*config.pipeline().max_variant_count(), 26);
        assert_eq!(*config.generation().builder(), BuilderKind::Template);
        assert_eq!(config.storage().store, StoreKind::Memory);
        assert!(config.projects().known().is_empty());
        assert_eq!(config.logging().level(), "info");
    }

    #[test]
    fn overrides_replace_only_named_keys() {
        let config = ScriptoriumConfig::from_toml_str(
            "[pipeline]\nmax_variant_count = 4\n\n[storage]\nstore = \"actor\"",
        )
        .expect("valid");
        assert_eq!(*config.pipeline().max_variant_count(), 4);
        assert_eq!(*config.pipeline().generation_timeout_ms(), 30_000);
        assert_eq!(config.storage().store, StoreKind::Actor);
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let err = ScriptoriumConfig::from_toml_str("[server]\nbind = \"nowhere\"")
            .expect_err("invalid bind");
        assert_eq!(err.kind_label(), "Configuration");
    }
}
