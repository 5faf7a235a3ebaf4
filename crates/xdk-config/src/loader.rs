//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{CompilerConfig, ProjectConfig};
use crate::{ConfigError, ConfigResult, MANIFEST_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Compiler program used when neither project nor global config names one
pub const DEFAULT_COMPILER: &str = "xcc";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.xdk/config.toml) - lowest priority
/// 2. Project config (./xdk.toml) - overrides global
/// 3. Environment variables (XDK_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration, with global defaults and env overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where xdk.toml was found)
    pub project_root: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.xdk/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find xdk.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.finish(project_root, project_config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        self.finish(project_root, project_config)
    }

    fn finish(&mut self, project_root: PathBuf, project: ProjectConfig) -> ConfigResult<Config> {
        let global = self.load_global_config()?;
        let project = merge_global_defaults(project, &global);
        let project = self.apply_env_overrides(project)?;

        Ok(Config {
            project,
            global,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(PathBuf, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(MANIFEST_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((current, project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(ConfigError::NotFound(start_dir.join(MANIFEST_FILE))),
            }
        }
    }

    /// Load global configuration from ~/.xdk/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                // No home directory means no global config
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// - XDK_OUTPUT_DIR: output root
    /// - XDK_COMPILER: compiler program
    /// - XDK_VERBOSE: pass -verbose to the compiler
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(output) = env::var("XDK_OUTPUT_DIR") {
            if output.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "XDK_OUTPUT_DIR".to_string(),
                    reason: "output directory cannot be empty".to_string(),
                });
            }
            config.output.root = Some(PathBuf::from(output));
        }

        if let Ok(command) = env::var("XDK_COMPILER") {
            if command.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "XDK_COMPILER".to_string(),
                    reason: "command cannot be empty".to_string(),
                });
            }
            config.compiler.get_or_insert_with(Default::default).command = Some(command);
        }

        if let Ok(verbose) = env::var("XDK_VERBOSE") {
            let verbose_bool = matches!(verbose.to_lowercase().as_str(), "true" | "1" | "yes");
            config.compiler.get_or_insert_with(Default::default).verbose = Some(verbose_bool);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill compiler settings the project leaves unset from the global defaults
fn merge_global_defaults(mut project: ProjectConfig, global: &GlobalConfig) -> ProjectConfig {
    let Some(defaults) = &global.compiler else {
        return project;
    };

    let compiler = project.compiler.get_or_insert_with(CompilerConfig::default);
    if compiler.command.is_none() {
        compiler.command = defaults.command.clone();
        // Leading args belong to the command they were written for
        if compiler.args.is_empty() {
            compiler.args = defaults.args.clone();
        }
    }
    if compiler.verbose.is_none() {
        compiler.verbose = defaults.verbose;
    }
    project
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve a manifest path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Absolute output root
    pub fn output_root(&self) -> PathBuf {
        self.resolve(self.project.output.root())
    }

    /// Artifact file extension
    pub fn extension(&self) -> &str {
        self.project.output.extension()
    }

    /// Compiler program
    pub fn compiler_command(&self) -> &str {
        self.project
            .compiler
            .as_ref()
            .and_then(|c| c.command.as_deref())
            .unwrap_or(DEFAULT_COMPILER)
    }

    /// Leading compiler arguments
    pub fn compiler_args(&self) -> &[String] {
        self.project
            .compiler
            .as_ref()
            .map(|c| c.args.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the compiler runs with -verbose (default: true)
    pub fn compiler_verbose(&self) -> bool {
        self.project
            .compiler
            .as_ref()
            .and_then(|c| c.verbose)
            .unwrap_or(true)
    }

    /// Absolute path of the prebuilt compiler artifact, if configured
    pub fn compiler_artifact(&self) -> Option<PathBuf> {
        self.project
            .compiler
            .as_ref()
            .and_then(|c| c.artifact.as_deref())
            .map(|p| self.resolve(p))
    }

    /// Absolute path of the resource tree, if configured
    pub fn resources(&self) -> Option<PathBuf> {
        self.project.output.resources.as_deref().map(|p| self.resolve(p))
    }
}
