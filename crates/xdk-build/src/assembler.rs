//! Final output assembly
//!
//! Copies everything that is not compiled into the output tree: the static
//! resource tree, the prebuilt compiler artifact, and one launcher binary per
//! platform. Every run recopies unconditionally.

use crate::error::{BuildError, BuildResult};
use crate::layout::OutputLayout;
use crate::store::ArtifactStore;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A prebuilt launcher for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LauncherArtifact {
    /// Platform identifier
    pub platform: String,
    /// Launcher binary
    pub source: PathBuf,
}

impl LauncherArtifact {
    /// Create a launcher artifact
    pub fn new(platform: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            platform: platform.into(),
            source: source.into(),
        }
    }

    /// File name the launcher keeps in `bin/`
    pub fn file_name(&self) -> BuildResult<&std::ffi::OsStr> {
        self.source.file_name().ok_or_else(|| {
            BuildError::InvalidConfig(format!(
                "launcher for '{}' has no file name: {}",
                self.platform,
                self.source.display()
            ))
        })
    }
}

/// What an assembly run copied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblySummary {
    pub resources_copied: usize,
    pub runtime_copied: usize,
    pub launchers_copied: usize,
    /// Module artifacts present in the output
    pub artifacts: Vec<PathBuf>,
}

/// Copies non-compiled inputs into the output tree
#[derive(Debug, Clone, Default)]
pub struct OutputAssembler {
    resources: Option<PathBuf>,
    compiler_artifact: Option<PathBuf>,
    launchers: Vec<LauncherArtifact>,
}

impl OutputAssembler {
    /// Create an assembler with nothing to copy
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror this tree into `resources/`
    pub fn with_resources(mut self, root: impl Into<PathBuf>) -> Self {
        self.resources = Some(root.into());
        self
    }

    /// Copy this file into `runtime/`
    pub fn with_compiler_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.compiler_artifact = Some(path.into());
        self
    }

    /// Copy these launchers into `bin/`
    pub fn with_launchers(mut self, launchers: Vec<LauncherArtifact>) -> Self {
        self.launchers = launchers;
        self
    }

    /// Check launcher file names do not collide in `bin/`
    pub fn validate(&self) -> BuildResult<()> {
        let mut names = HashSet::new();
        for launcher in &self.launchers {
            if !names.insert(launcher.file_name()?) {
                return Err(BuildError::InvalidConfig(format!(
                    "launchers share the file name {:?}",
                    launcher.file_name()?
                )));
            }
        }
        Ok(())
    }

    /// Assemble the output tree
    ///
    /// Every record in `store` must point at an existing artifact.
    pub fn assemble(
        &self,
        layout: &OutputLayout,
        store: &ArtifactStore,
    ) -> BuildResult<AssemblySummary> {
        self.validate()?;
        let mut summary = AssemblySummary::default();

        for record in store.records() {
            if !record.path.is_file() {
                return Err(BuildError::missing_artifact(&record.module, &record.path));
            }
            summary.artifacts.push(record.path.clone());
        }

        match &self.resources {
            Some(root) if root.is_dir() => {
                summary.resources_copied = copy_tree(root, &layout.resources_dir())?;
            }
            Some(root) => warn!(path = %root.display(), "resource tree not found, skipping"),
            None => {}
        }

        if let Some(artifact) = &self.compiler_artifact {
            let file_name = artifact.file_name().ok_or_else(|| {
                BuildError::InvalidConfig(format!(
                    "compiler artifact has no file name: {}",
                    artifact.display()
                ))
            })?;
            copy_file(artifact, &layout.runtime_dir().join(file_name))?;
            summary.runtime_copied += 1;
        }

        for launcher in &self.launchers {
            let dest = layout.bin_dir().join(launcher.file_name()?);
            copy_file(&launcher.source, &dest)?;
            debug!(platform = %launcher.platform, dest = %dest.display(), "launcher copied");
            summary.launchers_copied += 1;
        }

        Ok(summary)
    }
}

/// Copy one file, creating the destination directory
fn copy_file(from: &Path, to: &Path) -> BuildResult<()> {
    if !from.is_file() {
        return Err(BuildError::io(
            from,
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        ));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| BuildError::io(from, e))?;
    Ok(())
}

/// Mirror a directory tree, returning the number of files copied
fn copy_tree(from: &Path, to: &Path) -> BuildResult<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| from.to_path_buf());
            let error = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
            BuildError::io(path, error)
        })?;

        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| BuildError::InvalidConfig(format!("{} escapes {}", entry.path().display(), from.display())))?;
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| BuildError::io(&dest, e))?;
        } else {
            copy_file(entry.path(), &dest)?;
            copied += 1;
        }
    }
    debug!(from = %from.display(), files = copied, "resource tree copied");
    Ok(copied)
}
