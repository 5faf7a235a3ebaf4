//! Progress reporting and build summaries

use crate::assembler::AssemblySummary;
use crate::builder::BuildContext;
use crate::scheduler::{BuildTask, TaskRecord};
use serde::Serialize;
use std::path::PathBuf;

/// How much the build prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One line per compiled module
    #[default]
    Normal,
    /// Also reasons, library paths, fresh modules and timings
    Verbose,
    /// Errors only
    Quiet,
    /// Nothing during the build; the caller prints a JSON summary
    Json,
}

/// Prints build progress according to an [`OutputMode`]
#[derive(Debug, Clone)]
pub struct BuildProgress {
    mode: OutputMode,
}

impl BuildProgress {
    /// Create a progress printer
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// A printer that never prints
    pub fn silent() -> Self {
        Self::new(OutputMode::Quiet)
    }

    fn normal(&self) -> bool {
        matches!(self.mode, OutputMode::Normal | OutputMode::Verbose)
    }

    fn verbose(&self) -> bool {
        self.mode == OutputMode::Verbose
    }

    /// A compiler task is about to run
    pub fn task_started(&self, task: &BuildTask) {
        if !self.normal() {
            return;
        }
        println!("{:>12} {} ({})", "Compiling", task.label(), task.reason.describe());
        if self.verbose() {
            for path in &task.library_paths {
                println!("{:>12} -L {}", "", path.display());
            }
        }
    }

    /// A compiler task completed
    pub fn task_finished(&self, record: &TaskRecord) {
        if self.verbose() {
            println!(
                "{:>12} {} in {:.2}s",
                "Compiled",
                record.label,
                record.duration.as_secs_f64()
            );
        }
    }

    /// A module needed no work
    pub fn up_to_date(&self, module: &str) {
        if self.verbose() {
            println!("{:>12} {}", "Fresh", module);
        }
    }

    /// The output directory was assembled
    pub fn assembled(&self, summary: &AssemblySummary) {
        if self.verbose() {
            println!(
                "{:>12} {} resource file(s), {} runtime file(s), {} launcher(s)",
                "Assembled",
                summary.resources_copied,
                summary.runtime_copied,
                summary.launchers_copied
            );
        }
    }
}

/// Machine-readable outcome of a build
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub success: bool,
    pub output_root: PathBuf,
    pub total_modules: usize,
    pub compiled: Vec<String>,
    pub up_to_date: Vec<String>,
    pub invocations: usize,
    pub total_time: f64,
    pub compilation_time: f64,
    pub assembly_time: f64,
    pub tasks: Vec<TaskRecord>,
}

impl BuildSummary {
    /// Summarize a finished build
    pub fn from_context(context: &BuildContext) -> Self {
        let report = &context.report;
        Self {
            success: true,
            output_root: context.output_root.clone(),
            total_modules: context.stats.total_modules,
            compiled: report.compiled_modules(),
            up_to_date: report.up_to_date.clone(),
            invocations: report.executed.len(),
            total_time: context.stats.total_time.as_secs_f64(),
            compilation_time: context.stats.compilation_time.as_secs_f64(),
            assembly_time: context.stats.assembly_time.as_secs_f64(),
            tasks: report.executed.clone(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_default() {
        assert_eq!(OutputMode::default(), OutputMode::Normal);
    }

    #[test]
    fn test_progress_levels() {
        assert!(BuildProgress::new(OutputMode::Normal).normal());
        assert!(!BuildProgress::new(OutputMode::Normal).verbose());
        assert!(BuildProgress::new(OutputMode::Verbose).verbose());
        assert!(!BuildProgress::silent().normal());
        assert!(!BuildProgress::new(OutputMode::Json).normal());
    }

    #[test]
    fn test_summary_json_fields() {
        let summary = BuildSummary {
            success: true,
            output_root: PathBuf::from("/out"),
            total_modules: 3,
            compiled: vec!["Json".to_string()],
            up_to_date: vec!["Ecstasy".to_string(), "Bridge".to_string()],
            invocations: 1,
            total_time: 0.5,
            compilation_time: 0.4,
            assembly_time: 0.1,
            tasks: Vec::new(),
        };
        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["compiled"][0], "Json");
        assert_eq!(value["invocations"], 1);
    }
}
