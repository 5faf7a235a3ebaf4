//! Source-driven staleness detection
//!
//! A module is stale when it has never been built or when any file under its
//! source root is strictly newer than its artifact. Rebuilding a dependency
//! does not make its dependents stale.
//!
//! Timestamps come from the filesystem, so the check inherits its mtime
//! resolution: a source saved within the same tick as the artifact compares
//! equal and is treated as up to date.

use crate::build_order::ModuleNode;
use crate::error::{BuildError, BuildResult};
use crate::store::ArtifactStore;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Newest modification time under a source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnapshot {
    /// Newest mtime, `UNIX_EPOCH` for an empty tree
    pub newest: SystemTime,
    /// File that carries `newest`
    pub newest_file: Option<PathBuf>,
    /// Number of files seen
    pub file_count: usize,
}

impl SourceSnapshot {
    /// Walk `source_root` and record its newest file
    ///
    /// Always reads the filesystem; snapshots are never cached.
    pub fn capture(source_root: &Path) -> BuildResult<Self> {
        if !source_root.is_dir() {
            return Err(BuildError::io(
                source_root,
                io::Error::new(io::ErrorKind::NotFound, "source root not found"),
            ));
        }

        let mut snapshot = Self {
            newest: SystemTime::UNIX_EPOCH,
            newest_file: None,
            file_count: 0,
        };

        for entry in WalkDir::new(source_root).follow_links(true) {
            let entry = entry.map_err(|e| walk_error(source_root, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let modified = entry
                .metadata()
                .map_err(|e| walk_error(source_root, e))?
                .modified()
                .map_err(|e| BuildError::io(entry.path(), e))?;

            snapshot.file_count += 1;
            if snapshot.newest_file.is_none() || modified > snapshot.newest {
                snapshot.newest = modified;
                snapshot.newest_file = Some(entry.into_path());
            }
        }

        Ok(snapshot)
    }

    /// Whether the source tree holds no files
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

fn walk_error(root: &Path, error: walkdir::Error) -> BuildError {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let error = error
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
    BuildError::io(path, error)
}

/// Outcome of a staleness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Staleness {
    /// No artifact exists
    NeverBuilt,
    /// A source file is newer than the artifact
    SourcesNewer {
        source: SystemTime,
        artifact: SystemTime,
        file: Option<PathBuf>,
    },
    /// Artifact is at least as new as every source file
    UpToDate,
}

impl Staleness {
    /// Whether the module needs recompiling
    pub fn is_stale(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }

    /// Short human-readable reason
    pub fn describe(&self) -> String {
        match self {
            Self::NeverBuilt => "never built".to_string(),
            Self::SourcesNewer { file: Some(file), .. } => {
                format!("{} changed", file.display())
            }
            Self::SourcesNewer { file: None, .. } => "sources changed".to_string(),
            Self::UpToDate => "up to date".to_string(),
        }
    }
}

/// Decides whether modules need recompiling
#[derive(Debug, Default, Clone, Copy)]
pub struct StalenessDetector;

impl StalenessDetector {
    /// Create a new detector
    pub fn new() -> Self {
        Self
    }

    /// Check a module against its artifact record
    pub fn check(&self, module: &ModuleNode, store: &ArtifactStore) -> BuildResult<Staleness> {
        let snapshot = SourceSnapshot::capture(&module.source_root)?;

        let staleness = match store.timestamp(&module.name) {
            None => Staleness::NeverBuilt,
            Some(artifact) if snapshot.newest > artifact => Staleness::SourcesNewer {
                source: snapshot.newest,
                artifact,
                file: snapshot.newest_file,
            },
            Some(_) => Staleness::UpToDate,
        };

        debug!(
            module = %module.name,
            files = snapshot.file_count,
            state = %staleness.describe(),
            "staleness check"
        );
        Ok(staleness)
    }

    /// Whether a module needs recompiling
    pub fn is_stale(&self, module: &ModuleNode, store: &ArtifactStore) -> BuildResult<bool> {
        Ok(self.check(module, store)?.is_stale())
    }
}
