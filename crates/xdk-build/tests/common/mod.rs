//! Shared fixtures for xdk-build integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use xdk_build::{
    BuildError, BuildGraph, BuildResult, Compiler, CompilerInvocation, CompilerOutput,
    ModuleNode, ModuleRole, OutputLayout,
};

/// Write a source file and set its modification time
pub fn write_source(path: &Path, at: SystemTime) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "module x {}").unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(at)
        .unwrap();
}

pub fn hours_ago(hours: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(hours * 3600)
}


/// Four-module project: Ecstasy (core), Bridge, Json, Web -> Json
pub struct Project {
    pub temp: TempDir,
    pub graph: BuildGraph,
    pub layout: OutputLayout,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let graph = sample_graph(temp.path());
        for module in graph.modules() {
            write_source(&module.entry_point, hours_ago(2));
        }
        let layout = OutputLayout::new(temp.path().join("out"));
        Self {
            temp,
            graph,
            layout,
        }
    }

    pub fn source_root(&self, module: &str) -> PathBuf {
        self.graph.get_module(module).unwrap().source_root.clone()
    }

    /// Write a file under a module's source root, stamped now
    ///
    /// Call `age_outputs` first so the edit is strictly newer than every
    /// artifact regardless of filesystem timestamp resolution.
    pub fn edit(&self, module: &str, file: &str) {
        write_source(&self.source_root(module).join(file), SystemTime::now());
    }

    /// Backdate every file in the output tree by an hour
    pub fn age_outputs(&self) {
        for entry in walkdir::WalkDir::new(self.layout.root()) {
            let entry = entry.unwrap();
            if entry.file_type().is_file() {
                File::options()
                    .write(true)
                    .open(entry.path())
                    .unwrap()
                    .set_modified(hours_ago(1))
                    .unwrap();
            }
        }
    }

    pub fn lib(&self, file: &str) -> PathBuf {
        self.layout.lib_dir().join(file)
    }

    pub fn runtime(&self, file: &str) -> PathBuf {
        self.layout.runtime_dir().join(file)
    }
}

pub fn sample_graph(root: &Path) -> BuildGraph {
    let src = root.join("src");
    BuildGraph::new(
        ModuleNode::new("Ecstasy", ModuleRole::Core, src.join("ecstasy")),
        ModuleNode::new("Bridge", ModuleRole::Bridge, src.join("bridge"))
            .with_artifact_name("javatools_bridge.xtc")
            .with_compiled_name("_native.xtc"),
        vec![
            ModuleNode::library("Json", src.join("json")),
            ModuleNode::library("Web", src.join("web")).with_dependencies(vec!["Json".to_string()]),
        ],
    )
    .unwrap()
}

/// Records every invocation and writes one output file per entry point
pub struct FakeCompiler {
    outputs: HashMap<PathBuf, String>,
    fail_on: Option<String>,
    write_outputs: bool,
    pub invocations: Vec<CompilerInvocation>,
}

impl FakeCompiler {
    pub fn for_graph(graph: &BuildGraph) -> Self {
        Self {
            outputs: graph
                .modules()
                .map(|m| (m.entry_point.clone(), m.compiled_name.clone()))
                .collect(),
            fail_on: None,
            write_outputs: true,
            invocations: Vec::new(),
        }
    }

    /// Fail the task with this label
    pub fn failing_on(mut self, label: &str) -> Self {
        self.fail_on = Some(label.to_string());
        self
    }

    /// Succeed without writing anything
    pub fn without_outputs(mut self) -> Self {
        self.write_outputs = false;
        self
    }

    pub fn labels(&self) -> Vec<String> {
        self.invocations.iter().map(|i| i.label.clone()).collect()
    }
}

impl Compiler for FakeCompiler {
    fn compile(&mut self, invocation: &CompilerInvocation) -> BuildResult<CompilerOutput> {
        self.invocations.push(invocation.clone());

        if self.fail_on.as_deref() == Some(invocation.label.as_str()) {
            return Err(BuildError::compilation(
                &invocation.label,
                "error: unresolved name",
            ));
        }

        if self.write_outputs {
            for entry in &invocation.entry_points {
                let name = self.outputs.get(entry).ok_or_else(|| {
                    BuildError::compilation(
                        &invocation.label,
                        format!("unknown entry point {}", entry.display()),
                    )
                })?;
                let path = invocation.output_dir.join(name);
                fs::write(&path, "compiled").map_err(|e| BuildError::io(&path, e))?;
            }
        }

        Ok(CompilerOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        })
    }
}
