//! Dependency-ordered compilation of stale modules
//!
//! One build runs at a time against an output tree, and tasks run one after
//! another: each compiler call blocks until the process exits. The first
//! failure stops the build; records of tasks that already finished stay.

use crate::build_order::{BuildGraph, ModuleNode};
use crate::compiler::{Compiler, CompilerInvocation};
use crate::error::{BuildError, BuildResult};
use crate::layout::OutputLayout;
use crate::output::BuildProgress;
use crate::staleness::{Staleness, StalenessDetector};
use crate::store::ArtifactStore;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info};

/// Kind of compiler task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Joint compile of the core and bridge modules
    Bootstrap,
    /// Compile of a single library module
    Module,
}

/// A scheduled compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    /// Task kind
    pub kind: TaskKind,
    /// Modules compiled by this task
    pub modules: Vec<String>,
    /// Resolved library search path
    pub library_paths: Vec<PathBuf>,
    /// Entry points handed to the compiler
    pub entry_points: Vec<PathBuf>,
    /// Why the task was scheduled
    pub reason: Staleness,
}

impl BuildTask {
    /// Display label: module names joined with '+'
    pub fn label(&self) -> String {
        self.modules.join("+")
    }
}

/// A task that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub label: String,
    pub kind: TaskKind,
    pub modules: Vec<String>,
    pub library_paths: Vec<PathBuf>,
    pub duration: Duration,
}

/// Outcome of a scheduler run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Completed tasks in invocation order
    pub executed: Vec<TaskRecord>,
    /// Modules that needed no work
    pub up_to_date: Vec<String>,
    /// Time spent inside compiler tasks
    pub compilation_time: Duration,
}

impl BuildReport {
    /// Names of every compiled module, in invocation order
    pub fn compiled_modules(&self) -> Vec<String> {
        self.executed
            .iter()
            .flat_map(|t| t.modules.iter().cloned())
            .collect()
    }

    /// Whether the run compiled nothing
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty()
    }
}

/// Plans and runs compiler tasks over a module graph
#[derive(Debug, Clone)]
pub struct Scheduler<'a> {
    graph: &'a BuildGraph,
    layout: &'a OutputLayout,
    detector: StalenessDetector,
    compiler_verbose: bool,
}

impl<'a> Scheduler<'a> {
    /// Create a scheduler
    pub fn new(graph: &'a BuildGraph, layout: &'a OutputLayout) -> Self {
        Self {
            graph,
            layout,
            detector: StalenessDetector::new(),
            compiler_verbose: true,
        }
    }

    /// Whether compiler invocations carry `-verbose`
    pub fn with_compiler_verbose(mut self, verbose: bool) -> Self {
        self.compiler_verbose = verbose;
        self
    }

    /// Tasks a build would run, assuming every task succeeds
    pub fn plan(&self, store: &ArtifactStore) -> BuildResult<Vec<BuildTask>> {
        let mut tasks = Vec::new();

        if let Some(task) = self.bootstrap_task(store)? {
            tasks.push(task);
        }

        for module in self.graph.build_order() {
            let state = self.detector.check(module, store)?;
            if state.is_stale() {
                let library_paths = self
                    .graph
                    .dependencies(&module.name)?
                    .into_iter()
                    .map(|dep| self.layout.artifact_path(dep))
                    .collect();
                tasks.push(module_task(module, library_paths, state));
            }
        }

        Ok(tasks)
    }

    /// Compile every stale module in dependency order
    pub fn build(
        &self,
        store: &mut ArtifactStore,
        compiler: &mut dyn Compiler,
        progress: &BuildProgress,
    ) -> BuildResult<BuildReport> {
        let mut report = BuildReport::default();

        match self.bootstrap_task(store)? {
            Some(task) => self.run(task, store, compiler, progress, &mut report)?,
            None => {
                for module in [self.graph.core(), self.graph.bridge()] {
                    self.mark_fresh(module, progress, &mut report);
                }
            }
        }

        for module in self.graph.build_order() {
            let state = self.detector.check(module, store)?;
            if !state.is_stale() {
                self.mark_fresh(module, progress, &mut report);
                continue;
            }

            let library_paths = self.resolve_library_paths(module, store)?;
            let task = module_task(module, library_paths, state);
            self.run(task, store, compiler, progress, &mut report)?;
        }

        Ok(report)
    }

    /// The joint core+bridge task, if either is stale
    fn bootstrap_task(&self, store: &ArtifactStore) -> BuildResult<Option<BuildTask>> {
        let core = self.graph.core();
        let bridge = self.graph.bridge();

        let core_state = self.detector.check(core, store)?;
        let bridge_state = self.detector.check(bridge, store)?;

        let reason = if core_state.is_stale() {
            core_state
        } else if bridge_state.is_stale() {
            bridge_state
        } else {
            return Ok(None);
        };

        Ok(Some(BuildTask {
            kind: TaskKind::Bootstrap,
            modules: vec![core.name.clone(), bridge.name.clone()],
            library_paths: Vec::new(),
            entry_points: vec![core.entry_point.clone(), bridge.entry_point.clone()],
            reason,
        }))
    }

    /// Current store paths of a module's dependencies
    ///
    /// Dependencies are compiled or fresh by the time a dependent runs, so a
    /// missing record means the artifact vanished mid-build.
    fn resolve_library_paths(
        &self,
        module: &ModuleNode,
        store: &ArtifactStore,
    ) -> BuildResult<Vec<PathBuf>> {
        self.graph
            .dependencies(&module.name)?
            .into_iter()
            .map(|dep| match store.get(&dep.name) {
                Some(record) if record.is_built() => Ok(record.path.clone()),
                Some(record) => Err(BuildError::missing_artifact(&dep.name, &record.path)),
                None => Err(BuildError::missing_artifact(
                    &dep.name,
                    self.layout.artifact_path(dep),
                )),
            })
            .collect()
    }

    fn run(
        &self,
        task: BuildTask,
        store: &mut ArtifactStore,
        compiler: &mut dyn Compiler,
        progress: &BuildProgress,
        report: &mut BuildReport,
    ) -> BuildResult<()> {
        let label = task.label();
        info!(task = %label, reason = %task.reason.describe(), "compiling");
        progress.task_started(&task);

        self.layout.ensure_dirs()?;
        let invocation = CompilerInvocation {
            label: label.clone(),
            verbose: self.compiler_verbose,
            output_dir: self.layout.lib_dir(),
            library_paths: task.library_paths.clone(),
            entry_points: task.entry_points.clone(),
        };

        let modules: Vec<&ModuleNode> = task
            .modules
            .iter()
            .map(|name| {
                self.graph
                    .get_module(name)
                    .ok_or_else(|| BuildError::module_not_found(name))
            })
            .collect::<BuildResult<_>>()?;

        for module in &modules {
            self.discard_previous_output(module, store)?;
        }

        let started = Instant::now();
        compiler.compile(&invocation)?;

        for module in &modules {
            let path = self.materialize(module)?;
            store.record_compiled(&module.name, path, SystemTime::now());
        }

        let record = TaskRecord {
            label,
            kind: task.kind,
            modules: task.modules,
            library_paths: task.library_paths,
            duration: started.elapsed(),
        };
        info!(
            task = %record.label,
            elapsed_ms = record.duration.as_millis() as u64,
            "compiled"
        );
        progress.task_finished(&record);
        report.compilation_time += record.duration;
        report.executed.push(record);
        Ok(())
    }

    /// Delete what the compiler wrote for a module last time
    ///
    /// A module only counts as compiled if the compiler writes its output
    /// again. When the output is the artifact itself, the record is cleared
    /// with it.
    fn discard_previous_output(
        &self,
        module: &ModuleNode,
        store: &mut ArtifactStore,
    ) -> BuildResult<()> {
        let compiled = self.layout.compiled_path(module);
        match fs::remove_file(&compiled) {
            Ok(()) => debug!(path = %compiled.display(), "removed previous output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(&compiled, e)),
        }
        if compiled == self.layout.artifact_path(module) {
            store.record_missing(&module.name, compiled);
        }
        Ok(())
    }

    /// Move a module's compiler output to its final location
    fn materialize(&self, module: &ModuleNode) -> BuildResult<PathBuf> {
        let compiled = self.layout.compiled_path(module);
        let artifact = self.layout.artifact_path(module);

        if !compiled.is_file() {
            return Err(BuildError::compilation(
                &module.name,
                format!("compiler did not produce {}", compiled.display()),
            ));
        }

        if compiled != artifact {
            debug!(from = %compiled.display(), to = %artifact.display(), "relocating artifact");
            if let Some(parent) = artifact.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            fs::rename(&compiled, &artifact).map_err(|e| BuildError::io(&compiled, e))?;
        }

        Ok(artifact)
    }

    fn mark_fresh(&self, module: &ModuleNode, progress: &BuildProgress, report: &mut BuildReport) {
        debug!(module = %module.name, "up to date");
        progress.up_to_date(&module.name);
        report.up_to_date.push(module.name.clone());
    }
}

fn module_task(module: &ModuleNode, library_paths: Vec<PathBuf>, reason: Staleness) -> BuildTask {
    BuildTask {
        kind: TaskKind::Module,
        modules: vec![module.name.clone()],
        library_paths,
        entry_points: vec![module.entry_point.clone()],
        reason,
    }
}
