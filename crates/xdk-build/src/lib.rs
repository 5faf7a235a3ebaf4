//! XDK build orchestration
//!
//! Builds a set of interdependent modules with an external compiler:
//! - Module dependency graph and build order
//! - Staleness detection from source and artifact timestamps
//! - Joint core+bridge bootstrap compile, then one task per stale module
//! - Output tree assembly (resources, runtime, launchers)
//! - Progress reporting and build summaries

pub mod assembler;
pub mod build_order;
pub mod builder;
pub mod compiler;
pub mod error;
pub mod layout;
pub mod output;
pub mod scheduler;
pub mod staleness;
pub mod store;

// Re-export main types
pub use assembler::{AssemblySummary, LauncherArtifact, OutputAssembler};
pub use build_order::{BuildGraph, ModuleNode, ModuleRole};
pub use builder::{BuildContext, BuildStats, Builder, ModuleStatus};
pub use compiler::{Compiler, CompilerInvocation, CompilerOutput, ExternalCompiler};
pub use error::{BuildError, BuildResult};
pub use layout::OutputLayout;
pub use output::{BuildProgress, BuildSummary, OutputMode};
pub use scheduler::{BuildReport, BuildTask, Scheduler, TaskKind, TaskRecord};
pub use staleness::{SourceSnapshot, Staleness, StalenessDetector};
pub use store::{ArtifactRecord, ArtifactStore};
