/// Build system error types
use std::path::PathBuf;
use thiserror::Error;
use xdk_config::ConfigError;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Module not found: {module}")]
    ModuleNotFound { module: String },

    #[error("Duplicate module declaration: '{0}'")]
    DuplicateModule(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Compilation failed for module '{module}':\n{diagnostics}")]
    CompilationError { module: String, diagnostics: String },

    #[error("Failed to launch compiler '{command}' for module '{module}': {error}")]
    CompilerLaunch {
        module: String,
        command: String,
        error: std::io::Error,
    },

    #[error("Missing artifact for module '{module}': {path}")]
    MissingArtifact { module: String, path: PathBuf },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a compilation error
    pub fn compilation(module: impl Into<String>, diagnostics: impl ToString) -> Self {
        Self::CompilationError {
            module: module.into(),
            diagnostics: diagnostics.to_string(),
        }
    }

    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            module: module.into(),
        }
    }

    /// Create a missing artifact error
    pub fn missing_artifact(module: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact {
            module: module.into(),
            path: path.into(),
        }
    }

    /// Whether this error was raised while reading or validating configuration,
    /// before any compiler invocation
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::CircularDependency(_)
                | Self::ModuleNotFound { .. }
                | Self::DuplicateModule(_)
                | Self::InvalidConfig(_)
                | Self::Config(_)
        )
    }

    /// The module a compile-time failure belongs to
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::CompilationError { module, .. }
            | Self::CompilerLaunch { module, .. }
            | Self::MissingArtifact { module, .. } => Some(module),
            _ => None,
        }
    }
}
