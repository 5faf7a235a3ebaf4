//! Global Configuration (~/.xdk/config.toml)
//!
//! Handles user-level defaults stored in `~/.xdk/config.toml`.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.xdk/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Compiler defaults, used when the project does not set them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<GlobalCompilerConfig>,
}

/// Compiler defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalCompilerConfig {
    /// Default compiler program
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Default leading arguments
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Default verbosity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(compiler) = &self.compiler {
            if matches!(compiler.command.as_deref(), Some("")) {
                return Err(ConfigError::InvalidValue {
                    field: "compiler.command".to_string(),
                    reason: "command cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the global configuration file path (~/.xdk/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".xdk").join("config.toml"))
    }
}
