//! Build orchestration: config → graph → scheduler → assembler
use crate::assembler::{AssemblySummary, LauncherArtifact, OutputAssembler};
use crate::build_order::{BuildGraph, ModuleNode, ModuleRole};
use crate::compiler::{Compiler, ExternalCompiler};
use crate::error::BuildResult;
use crate::layout::OutputLayout;
use crate::output::{BuildProgress, OutputMode};
use crate::scheduler::{BuildReport, BuildTask, Scheduler};
use crate::staleness::{Staleness, StalenessDetector};
use crate::store::ArtifactStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use xdk_config::{Config, ConfigLoader, ModuleConfig};

/// Build context - result of a successful build
#[derive(Debug)]
pub struct BuildContext {
    /// Scheduler outcome
    pub report: BuildReport,
    /// What the assembler copied
    pub assembly: AssemblySummary,
    /// Build statistics
    pub stats: BuildStats,
    /// Output root the build wrote to
    pub output_root: PathBuf,
}

/// Build statistics
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Total number of modules
    pub total_modules: usize,
    /// Number of modules compiled
    pub compiled_modules: usize,
    /// Total build time
    pub total_time: Duration,
    /// Time spent compiling
    pub compilation_time: Duration,
    /// Time spent assembling the output tree
    pub assembly_time: Duration,
}

/// Staleness of one module, as reported by `xdk status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    pub name: String,
    pub role: ModuleRole,
    pub artifact: PathBuf,
    pub staleness: Staleness,
}

/// Main builder for orchestrating builds
#[derive(Debug)]
pub struct Builder {
    graph: BuildGraph,
    layout: OutputLayout,
    assembler: OutputAssembler,
    compiler: ExternalCompiler,
    compiler_verbose: bool,
    output_mode: OutputMode,
}

impl Builder {
    /// Create a builder for the project containing `project_dir`
    pub fn new(project_dir: impl AsRef<Path>) -> BuildResult<Self> {
        let config = ConfigLoader::new().load_from_directory(project_dir.as_ref())?;
        Self::from_config(&config)
    }

    /// Create a builder from a loaded configuration
    pub fn from_config(config: &Config) -> BuildResult<Self> {
        let project = &config.project;
        let extension = config.extension();

        let core = module_node(config, &project.core, ModuleRole::Core, extension);

        let bridge_config = &project.bridge;
        let bridge = ModuleNode::new(
            &bridge_config.name,
            ModuleRole::Bridge,
            config.resolve(&bridge_config.source),
        )
        .with_entry_point(bridge_config.entry())
        .with_artifact_name(bridge_config.artifact_name(extension))
        .with_compiled_name(bridge_config.produced_name(extension));

        let libraries = project
            .modules
            .iter()
            .map(|m| module_node(config, m, ModuleRole::Library, extension))
            .collect();

        let graph = BuildGraph::new(core, bridge, libraries)?;

        let mut assembler = OutputAssembler::new().with_launchers(
            project
                .launchers
                .iter()
                .map(|l| LauncherArtifact::new(&l.platform, config.resolve(&l.path)))
                .collect(),
        );
        if let Some(resources) = config.resources() {
            assembler = assembler.with_resources(resources);
        }
        if let Some(artifact) = config.compiler_artifact() {
            assembler = assembler.with_compiler_artifact(artifact);
        }
        assembler.validate()?;

        let compiler = ExternalCompiler::new(config.compiler_command())
            .with_args(config.compiler_args().to_vec())
            .with_working_dir(config.project_root());

        debug!(
            modules = graph.len(),
            output = %config.output_root().display(),
            "build graph ready"
        );

        Ok(Self {
            graph,
            layout: OutputLayout::new(config.output_root()),
            assembler,
            compiler,
            compiler_verbose: config.compiler_verbose(),
            output_mode: OutputMode::default(),
        })
    }

    /// Override the output root
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.layout = OutputLayout::new(root);
        self
    }

    /// Set the progress output mode
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Module graph
    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    /// Output layout
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Configured compiler
    pub fn compiler(&self) -> &ExternalCompiler {
        &self.compiler
    }

    fn scheduler(&self) -> Scheduler<'_> {
        Scheduler::new(&self.graph, &self.layout).with_compiler_verbose(self.compiler_verbose)
    }

    /// Execute the build with the configured compiler
    pub fn build(&self) -> BuildResult<BuildContext> {
        let mut compiler = self.compiler.clone();
        self.build_with(&mut compiler)
    }

    /// Execute the build with the given compiler
    pub fn build_with(&self, compiler: &mut dyn Compiler) -> BuildResult<BuildContext> {
        let build_start = Instant::now();
        let progress = BuildProgress::new(self.output_mode);

        let mut store = ArtifactStore::load(&self.graph, &self.layout)?;
        let report = self.scheduler().build(&mut store, compiler, &progress)?;

        let assembly_start = Instant::now();
        let assembly = self.assembler.assemble(&self.layout, &store)?;
        let assembly_time = assembly_start.elapsed();
        progress.assembled(&assembly);

        let stats = BuildStats {
            total_modules: self.graph.len(),
            compiled_modules: report.compiled_modules().len(),
            total_time: build_start.elapsed(),
            compilation_time: report.compilation_time,
            assembly_time,
        };

        info!(
            compiled = stats.compiled_modules,
            total = stats.total_modules,
            elapsed_ms = stats.total_time.as_millis() as u64,
            "build finished"
        );

        Ok(BuildContext {
            report,
            assembly,
            stats,
            output_root: self.layout.root().to_path_buf(),
        })
    }

    /// Tasks the next build would run
    pub fn plan(&self) -> BuildResult<Vec<BuildTask>> {
        let store = ArtifactStore::load(&self.graph, &self.layout)?;
        self.scheduler().plan(&store)
    }

    /// Staleness of every module: core, bridge, then libraries in build order
    pub fn status(&self) -> BuildResult<Vec<ModuleStatus>> {
        let store = ArtifactStore::load(&self.graph, &self.layout)?;
        let detector = StalenessDetector::new();
        self.graph
            .modules()
            .map(|module| -> BuildResult<ModuleStatus> {
                Ok(ModuleStatus {
                    name: module.name.clone(),
                    role: module.role,
                    artifact: self.layout.artifact_path(module),
                    staleness: detector.check(module, &store)?,
                })
            })
            .collect()
    }

    /// Remove the whole output root
    ///
    /// Returns whether anything was removed.
    pub fn clean(&self) -> BuildResult<bool> {
        let removed = self.layout.clean()?;
        if removed {
            info!(path = %self.layout.root().display(), "output removed");
        }
        Ok(removed)
    }
}

fn module_node(config: &Config, module: &ModuleConfig, role: ModuleRole, extension: &str) -> ModuleNode {
    ModuleNode::new(&module.name, role, config.resolve(&module.source))
        .with_entry_point(module.entry())
        .with_artifact_name(module.artifact_name(extension))
        .with_dependencies(module.depends.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use xdk_config::{BridgeConfig, GlobalConfig, OutputConfig, ProjectConfig};

    fn config(root: &Path) -> Config {
        let mut json = ModuleConfig::new("Json", "lib_json");
        json.entry = Some(PathBuf::from("src/module.x"));
        let mut web = ModuleConfig::new("Web", "lib_web");
        web.depends = vec!["Json".to_string()];

        Config {
            project: ProjectConfig {
                output: OutputConfig::default(),
                compiler: None,
                core: ModuleConfig::new("Ecstasy", "ecstasy"),
                bridge: BridgeConfig {
                    name: "Bridge".to_string(),
                    source: PathBuf::from("bridge"),
                    entry: None,
                    produces: Some("_native.xtc".to_string()),
                    artifact: Some("javatools_bridge.xtc".to_string()),
                },
                modules: vec![json, web],
                launchers: Vec::new(),
            },
            global: GlobalConfig::default(),
            project_root: root.to_path_buf(),
        }
    }

    #[test]
    fn test_from_config_resolves_paths() {
        let builder = Builder::from_config(&config(Path::new("/proj"))).unwrap();
        let graph = builder.graph();

        assert_eq!(graph.core().source_root, PathBuf::from("/proj/ecstasy"));
        assert_eq!(
            graph.core().entry_point,
            PathBuf::from("/proj/ecstasy/x/module.x")
        );
        assert_eq!(
            graph.get_module("Json").unwrap().entry_point,
            PathBuf::from("/proj/lib_json/src/module.x")
        );
        assert_eq!(builder.layout().root(), Path::new("/proj/build/xdk"));
        assert_eq!(builder.compiler().command(), "xcc");
    }

    #[test]
    fn test_from_config_bridge_names() {
        let builder = Builder::from_config(&config(Path::new("/proj"))).unwrap();
        let bridge = builder.graph().bridge();
        assert_eq!(bridge.compiled_name, "_native.xtc");
        assert_eq!(bridge.artifact_name, "javatools_bridge.xtc");
        assert_eq!(
            builder.layout().artifact_path(bridge),
            PathBuf::from("/proj/build/xdk/runtime/javatools_bridge.xtc")
        );
    }

    #[test]
    fn test_from_config_rejects_unknown_dependency() {
        let mut config = config(Path::new("/proj"));
        config.project.modules[1].depends = vec!["Missing".to_string()];
        let err = Builder::from_config(&config).unwrap_err();
        assert!(matches!(err, BuildError::ModuleNotFound { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_with_output_root_overrides_layout() {
        let builder = Builder::from_config(&config(Path::new("/proj")))
            .unwrap()
            .with_output_root("/tmp/out");
        assert_eq!(builder.layout().root(), Path::new("/tmp/out"));
    }

    #[test]
    fn test_clean_missing_root_is_ok() {
        let temp = tempfile::TempDir::new().unwrap();
        let builder = Builder::from_config(&config(temp.path()))
            .unwrap()
            .with_output_root(temp.path().join("never-built"));
        assert!(!builder.clean().unwrap());
    }
}
