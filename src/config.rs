use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::query_planner::optimizer::projection_push_down::DEFAULT_ALIAS_PREFIX;
use crate::vendor::{vendor_for_product, Vendor};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Compiler configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Product name probed like the one a live connection reports
    #[validate(length(min = 1, message = "Vendor name cannot be empty"))]
    pub vendor: String,

    /// YAML schema description
    pub schema_file: Option<String>,

    /// Row cap applied to every compiled statement
    #[validate(range(
        max = 1_000_000_000,
        message = "Row limit must not exceed 1000000000"
    ))]
    pub row_limit: Option<u64>,

    /// Prefix of generated subquery aliases
    #[validate(length(
        min = 1,
        max = 32,
        message = "Alias prefix must be between 1 and 32 characters"
    ))]
    pub alias_prefix: String,

    /// Whether table statements are compiled as `SELECT DISTINCT`
    pub use_distinct: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            vendor: "SQL-92".to_string(),
            schema_file: None,
            row_limit: None,
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
            use_distinct: false,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            vendor: env::var("RELGRAPH_VENDOR").unwrap_or_else(|_| "SQL-92".to_string()),
            schema_file: env::var("RELGRAPH_SCHEMA_FILE").ok(),
            row_limit: parse_optional_env_var("RELGRAPH_ROW_LIMIT")?,
            alias_prefix: env::var("RELGRAPH_ALIAS_PREFIX")
                .unwrap_or_else(|_| DEFAULT_ALIAS_PREFIX.to_string()),
            use_distinct: parse_env_var("RELGRAPH_USE_DISTINCT", "false")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation. Options the
    /// command line leaves out keep their defaults.
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file. Keys the file leaves out keep
    /// their defaults.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge(ConfigOverlay::from_yaml_file(path)?);
        config.validate()?;
        Ok(config)
    }

    /// Layers the keys present in a YAML file over this configuration.
    pub fn merge_yaml_file<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let mut merged = self.clone();
        merged.merge(ConfigOverlay::from_yaml_file(path)?);
        merged.validate()?;
        *self = merged;
        Ok(())
    }

    /// Overrides the fields `overlay` sets
    pub fn merge(&mut self, overlay: ConfigOverlay) {
        if let Some(vendor) = overlay.vendor {
            self.vendor = vendor;
        }
        if overlay.schema_file.is_some() {
            self.schema_file = overlay.schema_file;
        }
        if overlay.row_limit.is_some() {
            self.row_limit = overlay.row_limit;
        }
        if let Some(alias_prefix) = overlay.alias_prefix {
            self.alias_prefix = alias_prefix;
        }
        if let Some(use_distinct) = overlay.use_distinct {
            self.use_distinct = use_distinct;
        }
    }

    /// Overrides the fields the command line actually set.
    pub fn apply_cli(&mut self, cli: CliConfig) {
        if let Some(vendor) = cli.vendor {
            self.vendor = vendor;
        }
        if cli.schema_file.is_some() {
            self.schema_file = cli.schema_file;
        }
        if cli.row_limit.is_some() {
            self.row_limit = cli.row_limit;
        }
        if cli.use_distinct {
            self.use_distinct = true;
        }
    }

    pub fn vendor(&self) -> &'static dyn Vendor {
        vendor_for_product(&self.vendor)
    }
}

/// Configuration keys as written in a YAML file; absent keys are `None`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    pub vendor: Option<String>,
    pub schema_file: Option<String>,
    pub row_limit: Option<u64>,
    pub alias_prefix: Option<String>,
    pub use_distinct: Option<bool>,
}

impl ConfigOverlay {
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub vendor: Option<String>,
    pub schema_file: Option<String>,
    pub row_limit: Option<u64>,
    pub use_distinct: bool,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

fn parse_optional_env_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e| ConfigError::Parse {
            field: key.to_string(),
            value,
            source: Box::new(e),
        }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVar(e)),
    }
}
