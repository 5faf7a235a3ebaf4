//! External compiler invocation
//!
//! The compiler is an opaque process. It is handed an output directory, an
//! ordered list of `-L` library paths and one or more entry points, and is
//! expected to write one artifact per compiled module into the output
//! directory.

use crate::error::{BuildError, BuildResult};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInvocation {
    /// Module (or joint task) being compiled, for error reporting
    pub label: String,
    /// Pass `-verbose`
    pub verbose: bool,
    /// Directory the compiler writes artifacts into
    pub output_dir: PathBuf,
    /// Library search path, first match wins
    pub library_paths: Vec<PathBuf>,
    /// Module entry points
    pub entry_points: Vec<PathBuf>,
}

impl CompilerInvocation {
    /// Compiler flags and operands, without any configured leading arguments
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if self.verbose {
            args.push(OsString::from("-verbose"));
        }
        args.push(OsString::from("-o"));
        args.push(self.output_dir.clone().into_os_string());
        for path in &self.library_paths {
            args.push(OsString::from("-L"));
            args.push(path.clone().into_os_string());
        }
        for entry in &self.entry_points {
            args.push(entry.clone().into_os_string());
        }
        args
    }
}

/// Captured result of a compiler run
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    /// Exit code
    pub exit_code: i32,
    /// Stdout output
    pub stdout: String,
    /// Stderr output
    pub stderr: String,
    /// Wall time
    pub duration: Duration,
}

impl CompilerOutput {
    /// Check if the compiler succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Diagnostic text: stderr, or stdout when stderr is empty
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Something that can compile modules
///
/// Returns an error for any failed run; an `Ok` output always means success.
pub trait Compiler {
    fn compile(&mut self, invocation: &CompilerInvocation) -> BuildResult<CompilerOutput>;
}

/// Runs a compiler as a child process
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
    /// Program to run
    command: String,
    /// Arguments placed before the compiler flags (JVM options, main class, ...)
    leading_args: Vec<String>,
    /// Working directory for the child
    working_dir: Option<PathBuf>,
}

impl ExternalCompiler {
    /// Create a compiler that runs `command`
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            leading_args: Vec::new(),
            working_dir: None,
        }
    }

    /// Set leading arguments
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program name
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Full argument list for an invocation
    pub fn command_line(&self, invocation: &CompilerInvocation) -> Vec<OsString> {
        self.leading_args
            .iter()
            .map(OsString::from)
            .chain(invocation.args())
            .collect()
    }
}

impl Compiler for ExternalCompiler {
    fn compile(&mut self, invocation: &CompilerInvocation) -> BuildResult<CompilerOutput> {
        let args = self.command_line(invocation);
        debug!(command = %self.command, ?args, "running compiler");

        let start = Instant::now();
        let mut command = Command::new(&self.command);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .spawn()
            .and_then(|child| child.wait_with_output())
            .map_err(|e| BuildError::CompilerLaunch {
                module: invocation.label.clone(),
                command: self.command.clone(),
                error: e,
            })?;

        let result = CompilerOutput {
            // Killed by a signal: no code, count as failure
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        if !result.success() {
            let diagnostics = result.diagnostics();
            return Err(BuildError::compilation(
                &invocation.label,
                if diagnostics.is_empty() {
                    format!("compiler exited with status {}", result.exit_code)
                } else {
                    diagnostics
                },
            ));
        }

        info!(
            module = %invocation.label,
            elapsed_ms = result.duration.as_millis() as u64,
            "compiler finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> CompilerInvocation {
        CompilerInvocation {
            label: "Web".to_string(),
            verbose: true,
            output_dir: PathBuf::from("/out/lib"),
            library_paths: vec![
                PathBuf::from("/out/lib/Ecstasy.xtc"),
                PathBuf::from("/out/runtime/javatools_bridge.xtc"),
                PathBuf::from("/out/lib/Json.xtc"),
            ],
            entry_points: vec![PathBuf::from("/src/lib_web/x/module.x")],
        }
    }

    #[test]
    fn test_invocation_args_order() {
        let args: Vec<String> = invocation()
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "-verbose",
                "-o",
                "/out/lib",
                "-L",
                "/out/lib/Ecstasy.xtc",
                "-L",
                "/out/runtime/javatools_bridge.xtc",
                "-L",
                "/out/lib/Json.xtc",
                "/src/lib_web/x/module.x",
            ]
        );
    }

    #[test]
    fn test_invocation_without_verbose_or_libraries() {
        let invocation = CompilerInvocation {
            verbose: false,
            library_paths: Vec::new(),
            ..invocation()
        };
        let args = invocation.args();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], OsString::from("-o"));
    }

    #[test]
    fn test_command_line_prepends_leading_args() {
        let compiler = ExternalCompiler::new("java").with_args(vec![
            "-ea".to_string(),
            "org.xvm.tool.Compiler".to_string(),
        ]);
        let line = compiler.command_line(&invocation());
        assert_eq!(line[0], OsString::from("-ea"));
        assert_eq!(line[1], OsString::from("org.xvm.tool.Compiler"));
        assert_eq!(line[2], OsString::from("-verbose"));
        assert_eq!(compiler.command(), "java");
    }

    #[test]
    fn test_output_diagnostics_prefers_stderr() {
        let output = CompilerOutput {
            exit_code: 1,
            stdout: "compiling...".to_string(),
            stderr: "error: unknown type\n".to_string(),
            duration: Duration::ZERO,
        };
        assert!(!output.success());
        assert_eq!(output.diagnostics(), "error: unknown type");

        let output = CompilerOutput {
            stderr: String::new(),
            ..output
        };
        assert_eq!(output.diagnostics(), "compiling...");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_compiler_failure_reports_module() {
        let mut compiler = ExternalCompiler::new("sh")
            .with_args(vec!["-c".to_string(), "echo 'bad module' >&2; exit 3".to_string()]);
        let err = compiler.compile(&invocation()).unwrap_err();
        match err {
            BuildError::CompilationError { module, diagnostics } => {
                assert_eq!(module, "Web");
                assert_eq!(diagnostics, "bad module");
            }
            other => panic!("Expected CompilationError, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_external_compiler_success() {
        // `sh -c 'script' arg0 args...`: extra args become positional parameters
        let mut compiler = ExternalCompiler::new("sh").with_args(vec![
            "-c".to_string(),
            "echo compiled \"$#\"".to_string(),
            "xcc".to_string(),
        ]);
        let output = compiler.compile(&invocation()).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "compiled 10");
    }

    #[test]
    fn test_missing_compiler_is_launch_error() {
        let mut compiler = ExternalCompiler::new("definitely-not-a-real-compiler-xdk");
        let err = compiler.compile(&invocation()).unwrap_err();
        assert!(matches!(err, BuildError::CompilerLaunch { .. }));
        assert_eq!(err.module(), Some("Web"));
    }
}
