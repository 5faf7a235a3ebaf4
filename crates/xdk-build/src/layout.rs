//! Output directory layout
//!
//! ```text
//! <root>/lib/<Module>.xtc        library modules (and the core)
//! <root>/runtime/<bridge>.xtc    renamed bridge artifact, prebuilt compiler
//! <root>/bin/<launcher>          platform launchers
//! <root>/resources/**            static resource tree
//! ```

use crate::build_order::{ModuleNode, ModuleRole};
use crate::error::{BuildError, BuildResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Paths inside the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the compiler writes into
    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// Directory holding the bridge artifact and the prebuilt compiler
    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join("runtime")
    }

    /// Launcher directory
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Resource tree directory
    pub fn resources_dir(&self) -> PathBuf {
        self.root.join("resources")
    }

    /// Final location of a module's artifact
    pub fn artifact_path(&self, module: &ModuleNode) -> PathBuf {
        match module.role {
            ModuleRole::Bridge => self.runtime_dir().join(&module.artifact_name),
            ModuleRole::Core | ModuleRole::Library => self.lib_dir().join(&module.artifact_name),
        }
    }

    /// Where the compiler writes a module's output
    pub fn compiled_path(&self, module: &ModuleNode) -> PathBuf {
        self.lib_dir().join(&module.compiled_name)
    }

    /// Create the compiler output directories
    pub fn ensure_dirs(&self) -> BuildResult<()> {
        for dir in [self.lib_dir(), self.runtime_dir()] {
            fs::create_dir_all(&dir).map_err(|e| BuildError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Remove the whole output root
    ///
    /// Returns whether anything was removed.
    pub fn clean(&self) -> BuildResult<bool> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BuildError::io(&self.root, e)),
        }
    }
}
