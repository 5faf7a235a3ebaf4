//! Artifact store: where each module's artifact lives and when it was built
//!
//! The store is seeded from the filesystem at the start of a build and then
//! updated by the scheduler as tasks complete. It is an explicit value passed
//! to whoever needs it; nothing here is global.

use crate::build_order::BuildGraph;
use crate::error::{BuildError, BuildResult};
use crate::layout::OutputLayout;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A module's artifact location and build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    /// Module name
    pub module: String,
    /// Artifact path
    pub path: PathBuf,
    /// Last modified, `None` if never built
    pub modified: Option<SystemTime>,
}

impl ArtifactRecord {
    /// Whether the artifact has been built
    pub fn is_built(&self) -> bool {
        self.modified.is_some()
    }
}

/// Records for every module of a graph
#[derive(Debug, Default)]
pub struct ArtifactStore {
    records: HashMap<String, ArtifactRecord>,
}

impl ArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from the artifacts currently on disk
    pub fn load(graph: &BuildGraph, layout: &OutputLayout) -> BuildResult<Self> {
        let mut store = Self::new();
        for module in graph.modules() {
            let path = layout.artifact_path(module);
            let modified = modified_time(&path)?;
            store.insert(ArtifactRecord {
                module: module.name.clone(),
                path,
                modified,
            });
        }
        Ok(store)
    }

    /// Insert or replace a record
    pub fn insert(&mut self, record: ArtifactRecord) {
        self.records.insert(record.module.clone(), record);
    }

    /// Get a module's record
    pub fn get(&self, module: &str) -> Option<&ArtifactRecord> {
        self.records.get(module)
    }

    /// Artifact timestamp, `None` when never built or unknown
    pub fn timestamp(&self, module: &str) -> Option<SystemTime> {
        self.records.get(module).and_then(|r| r.modified)
    }

    /// Record a completed compilation
    pub fn record_compiled(&mut self, module: &str, path: PathBuf, completed: SystemTime) {
        self.insert(ArtifactRecord {
            module: module.to_string(),
            path,
            modified: Some(completed),
        });
    }

    /// Mark a module's artifact as gone
    pub fn record_missing(&mut self, module: &str, path: PathBuf) {
        self.insert(ArtifactRecord {
            module: module.to_string(),
            path,
            modified: None,
        });
    }

    /// All records, sorted by module name
    pub fn records(&self) -> Vec<&ArtifactRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.module.cmp(&b.module));
        records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Modification time of a file, `None` if it does not exist
pub(crate) fn modified_time(path: &Path) -> BuildResult<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(metadata) => metadata
            .modified()
            .map(Some)
            .map_err(|e| BuildError::io(path, e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(path, e)),
    }
}
