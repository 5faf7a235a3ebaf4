//! Project Configuration (xdk.toml)
//!
//! Declares the modules of the kit, the compiler to invoke, the launchers to
//! ship and where the assembled output goes. Paths are kept as written; the
//! loader resolves them against the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default output root, relative to the project root
pub const DEFAULT_OUTPUT_ROOT: &str = "build/xdk";
/// Default artifact file extension
pub const DEFAULT_EXTENSION: &str = "xtc";
/// Default entry point, relative to a module's source root
pub const DEFAULT_ENTRY: &str = "x/module.x";

/// Project configuration from xdk.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Output layout
    #[serde(default)]
    pub output: OutputConfig,

    /// Compiler invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerConfig>,

    /// Core runtime module, built before everything else
    pub core: ModuleConfig,

    /// Native bridge module, compiled together with the core
    pub bridge: BridgeConfig,

    /// Library modules
    #[serde(default, rename = "module")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleConfig>,

    /// Prebuilt launcher binaries
    #[serde(default, rename = "launcher")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub launchers: Vec<LauncherConfig>,
}

/// Output layout configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output root (default: "build/xdk")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Static resource tree mirrored into `resources/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<PathBuf>,

    /// Artifact file extension (default: "xtc")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl OutputConfig {
    /// Configured output root, or the default
    pub fn root(&self) -> &Path {
        self.root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_ROOT))
    }

    /// Configured artifact extension, or the default
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }
}

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Program to run (e.g. "java")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Leading arguments placed before the compiler flags
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Pass `-verbose` to the compiler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Prebuilt compiler artifact shipped in `runtime/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

/// A compiled module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Module name
    pub name: String,

    /// Source root directory
    pub source: PathBuf,

    /// Entry point relative to the source root (default: "x/module.x")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,

    /// Artifact file name (default: "<name>.<extension>")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Explicit dependencies, in library search order
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
}

impl ModuleConfig {
    /// Create a module config with defaults
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            entry: None,
            artifact: None,
            depends: Vec::new(),
        }
    }

    /// Entry point relative to the source root
    pub fn entry(&self) -> &Path {
        self.entry.as_deref().unwrap_or_else(|| Path::new(DEFAULT_ENTRY))
    }

    /// Artifact file name for the given extension
    pub fn artifact_name(&self, extension: &str) -> String {
        self.artifact
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.name, extension))
    }
}

/// The bridge module
///
/// The compiler emits the bridge under `produces` next to the core artifact;
/// the build then moves it to `artifact` in the runtime directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Module name
    pub name: String,

    /// Source root directory
    pub source: PathBuf,

    /// Entry point relative to the source root (default: "x/module.x")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,

    /// File name the compiler writes (default: "<name>.<extension>")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<String>,

    /// Final file name in `runtime/` (default: same as `produces`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl BridgeConfig {
    /// Entry point relative to the source root
    pub fn entry(&self) -> &Path {
        self.entry.as_deref().unwrap_or_else(|| Path::new(DEFAULT_ENTRY))
    }

    /// File name the compiler writes for the bridge
    pub fn produced_name(&self, extension: &str) -> String {
        self.produces
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.name, extension))
    }

    /// Final artifact file name
    pub fn artifact_name(&self, extension: &str) -> String {
        self.artifact
            .clone()
            .unwrap_or_else(|| self.produced_name(extension))
    }
}

/// A prebuilt launcher binary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Target platform (e.g. "macos", "windows")
    pub platform: String,

    /// Path to the launcher binary
    pub path: PathBuf,
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    ///
    /// Checks field-level shape only. Dependency references and cycles are
    /// checked when the module graph is built.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.output.extension().is_empty() || self.output.extension().starts_with('.') {
            return Err(ConfigError::InvalidValue {
                field: "output.extension".to_string(),
                reason: format!("invalid extension '{}'", self.output.extension()),
            });
        }

        validate_name("core.name", &self.core.name)?;
        if !self.core.depends.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "core.depends".to_string(),
                reason: "the core module cannot have dependencies".to_string(),
            });
        }

        validate_name("bridge.name", &self.bridge.name)?;
        if let Some(produces) = &self.bridge.produces {
            validate_file_name("bridge.produces", produces)?;
        }
        if let Some(artifact) = &self.bridge.artifact {
            validate_file_name("bridge.artifact", artifact)?;
        }

        for module in &self.modules {
            validate_name("module.name", &module.name)?;
            if let Some(artifact) = &module.artifact {
                validate_file_name(&format!("module '{}' artifact", module.name), artifact)?;
            }
        }

        let mut platforms = HashSet::new();
        for launcher in &self.launchers {
            if launcher.platform.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "launcher.platform".to_string(),
                    reason: "platform cannot be empty".to_string(),
                });
            }
            if !platforms.insert(launcher.platform.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "launcher.platform".to_string(),
                    reason: format!("duplicate launcher for '{}'", launcher.platform),
                });
            }
        }

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
}

fn validate_name(field: &str, name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_whitespace()) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("invalid module name '{}'", name),
        });
    }
    Ok(())
}

fn validate_file_name(field: &str, file_name: &str) -> ConfigResult<()> {
    if file_name.is_empty() || file_name.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a plain file name", file_name),
        });
    }
    Ok(())
}
