//! Module dependency graph and build order
//!
//! The core and bridge modules are implicit dependencies of every library
//! module. They are compiled together before anything else, so the
//! topological sort only has to order the library modules among themselves.
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Entry point used when a module does not name one
pub const DEFAULT_ENTRY_POINT: &str = "x/module.x";

/// What part a module plays in the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleRole {
    /// Core runtime module
    Core,
    /// Native bridge module, compiled together with the core
    Bridge,
    /// Any other module
    Library,
}

impl std::fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Bridge => write!(f, "bridge"),
            Self::Library => write!(f, "library"),
        }
    }
}

/// A module in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    /// Module name
    pub name: String,
    /// Role in the build
    pub role: ModuleRole,
    /// Source root directory
    pub source_root: PathBuf,
    /// Entry point passed to the compiler
    pub entry_point: PathBuf,
    /// File name the compiler writes into the library directory
    pub compiled_name: String,
    /// Final artifact file name
    pub artifact_name: String,
    /// Explicit dependencies (other module names), in library search order
    pub dependencies: Vec<String>,
}

impl ModuleNode {
    /// Create a new module node with the default entry point and `<name>.xtc` artifact
    pub fn new(name: impl Into<String>, role: ModuleRole, source_root: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let source_root = source_root.into();
        let artifact_name = format!("{}.xtc", name);
        Self {
            entry_point: source_root.join(DEFAULT_ENTRY_POINT),
            compiled_name: artifact_name.clone(),
            artifact_name,
            name,
            role,
            source_root,
            dependencies: Vec::new(),
        }
    }

    /// Shorthand for a library module
    pub fn library(name: impl Into<String>, source_root: impl Into<PathBuf>) -> Self {
        Self::new(name, ModuleRole::Library, source_root)
    }

    /// Add dependencies
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the entry point, relative to the source root
    pub fn with_entry_point(mut self, entry: impl AsRef<Path>) -> Self {
        self.entry_point = self.source_root.join(entry);
        self
    }

    /// Set the artifact file name (also the name the compiler writes)
    pub fn with_artifact_name(mut self, artifact_name: impl Into<String>) -> Self {
        self.artifact_name = artifact_name.into();
        self.compiled_name = self.artifact_name.clone();
        self
    }

    /// Set the file name the compiler writes, when it differs from the artifact name
    pub fn with_compiled_name(mut self, compiled_name: impl Into<String>) -> Self {
        self.compiled_name = compiled_name.into();
        self
    }
}

/// Validated, acyclic module graph
#[derive(Debug, Clone)]
pub struct BuildGraph {
    core: ModuleNode,
    bridge: ModuleNode,
    /// Library modules in declaration order
    libraries: Vec<ModuleNode>,
    /// Library name -> index into `libraries`
    index: HashMap<String, usize>,
    /// Topological order of `libraries`
    order: Vec<usize>,
}

impl BuildGraph {
    /// Build and validate the graph
    ///
    /// Fails with a configuration error on duplicate names, modules sharing
    /// an output file, dependencies on undeclared modules, or cycles.
    pub fn new(core: ModuleNode, bridge: ModuleNode, libraries: Vec<ModuleNode>) -> BuildResult<Self> {
        if core.role != ModuleRole::Core || bridge.role != ModuleRole::Bridge {
            return Err(BuildError::InvalidConfig(
                "core and bridge modules must carry their roles".to_string(),
            ));
        }
        if !core.dependencies.is_empty() || !bridge.dependencies.is_empty() {
            return Err(BuildError::InvalidConfig(
                "core and bridge modules cannot declare dependencies".to_string(),
            ));
        }
        if core.name == bridge.name {
            return Err(BuildError::DuplicateModule(core.name.clone()));
        }

        let mut index = HashMap::new();
        for (i, module) in libraries.iter().enumerate() {
            if module.role != ModuleRole::Library {
                return Err(BuildError::InvalidConfig(format!(
                    "module '{}' is declared as {} but listed with the library modules",
                    module.name, module.role
                )));
            }
            if module.name == core.name
                || module.name == bridge.name
                || index.insert(module.name.clone(), i).is_some()
            {
                return Err(BuildError::DuplicateModule(module.name.clone()));
            }
        }

        check_output_names(&core, &bridge, &libraries)?;

        let mut graph = Self {
            core,
            bridge,
            libraries,
            index,
            order: Vec::new(),
        };
        graph.validate()?;
        graph.order = graph.compute_build_order()?;
        Ok(graph)
    }

    /// The core module
    pub fn core(&self) -> &ModuleNode {
        &self.core
    }

    /// The bridge module
    pub fn bridge(&self) -> &ModuleNode {
        &self.bridge
    }

    /// Library modules in declaration order
    pub fn libraries(&self) -> &[ModuleNode] {
        &self.libraries
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&ModuleNode> {
        if name == self.core.name {
            Some(&self.core)
        } else if name == self.bridge.name {
            Some(&self.bridge)
        } else {
            self.index.get(name).map(|&i| &self.libraries[i])
        }
    }

    /// Module count, core and bridge included
    pub fn len(&self) -> usize {
        self.libraries.len() + 2
    }

    /// A graph always holds the core and bridge modules
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Library modules in build order
    pub fn build_order(&self) -> impl Iterator<Item = &ModuleNode> {
        self.order.iter().map(|&i| &self.libraries[i])
    }

    /// Every module in build order: core, bridge, then libraries
    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        [&self.core, &self.bridge].into_iter().chain(self.build_order())
    }

    /// Resolved dependencies of a module, in library search order
    ///
    /// Core and bridge come first for every library module, followed by the
    /// explicit list. Repeated names keep their first position.
    pub fn dependencies(&self, name: &str) -> BuildResult<Vec<&ModuleNode>> {
        let module = self
            .get_module(name)
            .ok_or_else(|| BuildError::module_not_found(name))?;

        if module.role != ModuleRole::Library {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut deps = Vec::new();
        let implicit = [self.core.name.as_str(), self.bridge.name.as_str()];
        for dep in implicit
            .into_iter()
            .chain(module.dependencies.iter().map(String::as_str))
        {
            if seen.insert(dep) {
                // validate() guarantees every name resolves
                let node = self
                    .get_module(dep)
                    .ok_or_else(|| BuildError::module_not_found(dep))?;
                deps.push(node);
            }
        }
        Ok(deps)
    }

    /// Check all dependencies exist
    fn validate(&self) -> BuildResult<()> {
        for module in &self.libraries {
            for dep in &module.dependencies {
                if self.get_module(dep).is_none() {
                    return Err(BuildError::ModuleNotFound {
                        module: format!("{} (required by {})", dep, module.name),
                    });
                }
            }
        }
        Ok(())
    }

    /// Library indices that `module` waits on
    fn library_dependencies(&self, module: &ModuleNode) -> BTreeSet<usize> {
        module
            .dependencies
            .iter()
            .filter_map(|d| self.index.get(d).copied())
            .collect()
    }

    /// Compute topological build order using Kahn's algorithm
    ///
    /// Ties are broken by declaration order, so the result is deterministic.
    fn compute_build_order(&self) -> BuildResult<Vec<usize>> {
        let count = self.libraries.len();
        let mut in_degree = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (i, module) in self.libraries.iter().enumerate() {
            let deps = self.library_dependencies(module);
            in_degree[i] = deps.len();
            for dep in deps {
                dependents[dep].push(i);
            }
        }

        // Start with modules that have no library dependencies
        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut result = Vec::with_capacity(count);

        while let Some(current) = ready.pop_first() {
            result.push(current);
            for &dependent in &dependents[current] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if result.len() != count {
            let cycle = self.find_cycle();
            return Err(BuildError::CircularDependency(cycle));
        }

        Ok(result)
    }

    /// Find a cycle in the graph (for error reporting)
    fn find_cycle(&self) -> String {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for module in &self.libraries {
            if let Some(cycle) =
                self.dfs_find_cycle(&module.name, &mut visited, &mut rec_stack, &mut path)
            {
                return cycle;
            }
        }

        "unknown cycle".to_string()
    }

    /// DFS to find a cycle
    fn dfs_find_cycle(
        &self,
        module_name: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> Option<String> {
        if rec_stack.contains(module_name) {
            path.push(module_name.to_string());
            if let Some(start) = path.iter().position(|m| m == module_name) {
                return Some(path[start..].join(" -> "));
            }
            return Some(path.join(" -> "));
        }

        if visited.contains(module_name) {
            return None;
        }

        visited.insert(module_name.to_string());
        rec_stack.insert(module_name.to_string());
        path.push(module_name.to_string());

        if let Some(&i) = self.index.get(module_name) {
            for dep in &self.libraries[i].dependencies {
                if let Some(cycle) = self.dfs_find_cycle(dep, visited, rec_stack, path) {
                    return Some(cycle);
                }
            }
        }

        rec_stack.remove(module_name);
        path.pop();
        None
    }
}

/// Reject two modules writing the same file into the library directory
///
/// The core and library artifacts live there, and so does the bridge output
/// before it is moved into the runtime directory.
fn check_output_names(
    core: &ModuleNode,
    bridge: &ModuleNode,
    libraries: &[ModuleNode],
) -> BuildResult<()> {
    let files = [
        (core, core.artifact_name.as_str()),
        (core, core.compiled_name.as_str()),
        (bridge, bridge.compiled_name.as_str()),
    ]
    .into_iter()
    .chain(libraries.iter().flat_map(|m| {
        [(m, m.artifact_name.as_str()), (m, m.compiled_name.as_str())]
    }));

    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (module, file) in files {
        match owners.insert(file, module.name.as_str()) {
            Some(owner) if owner != module.name => {
                return Err(BuildError::InvalidConfig(format!(
                    "modules '{}' and '{}' both write lib/{}",
                    owner, module.name, file
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
