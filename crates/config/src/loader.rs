//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Default prefix for environment overrides
pub const ENV_PREFIX: &str = "CLOUD_ORDERS";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a TOML, YAML or JSON file, picked by extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let format = file_format(path)?;
        let content = std::fs::read_to_string(path)?;
        match format {
            FileFormat::Yaml => Self::from_yaml(&content),
            FileFormat::Json => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    pub fn from_toml(content: &str) -> Result<AppConfig> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<AppConfig> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load configuration from environment variables
    ///
    /// Uses default prefix "CLOUD_ORDERS"
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Environment variables should be in the format: PREFIX_SECTION__KEY
    /// For example: CLOUD_ORDERS_FULFILLMENT__MAX_TARGET_ACCOUNTS=10
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        let config = Config::builder().add_source(env_source(prefix)).build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Merge two configurations, with overlay taking precedence
    ///
    /// Sections are replaced wholesale; template maps are combined
    pub fn merge(base: AppConfig, overlay: AppConfig) -> AppConfig {
        let mut templates = base.templates;
        templates.querying.extend(overlay.templates.querying);
        templates.completed.extend(overlay.templates.completed);

        AppConfig {
            logging: overlay.logging,
            provider: overlay.provider,
            fulfillment: overlay.fulfillment,
            ticketing: overlay.ticketing,
            templates,
        }
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Individual keys set in the environment win over the file
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        debug!(path = %path.display(), prefix = env_prefix, "Loading configuration");
        Self::builder().add_file(path, true).add_env(env_prefix).build()
    }

    /// Build configuration using the config crate's builder pattern
    ///
    /// This allows for more complex configuration scenarios with multiple sources
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

fn file_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(FileFormat::Toml),
        Some("yaml" | "yml") => Ok(FileFormat::Yaml),
        Some("json") => Ok(FileFormat::Json),
        Some(other) => Err(ConfigError::LoadError(format!(
            "unsupported config file extension '{other}'"
        ))),
        None => Err(ConfigError::LoadError(format!(
            "{} has no file extension",
            path.display()
        ))),
    }
}

fn env_source(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Builder for complex configuration loading scenarios
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source; the extension picks the format
    ///
    /// Unknown extensions are read as TOML.
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = file_format(path).unwrap_or(FileFormat::Toml);
        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(env_source(prefix));
        self
    }

    /// Set a default value for a key
    pub fn set_default(mut self, key: &str, value: &str) -> Result<Self> {
        self.builder = self.builder.set_default(key, value)?;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}
