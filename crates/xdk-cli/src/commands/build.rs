//! Build command - incremental compile and output assembly

use super::load_builder;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use xdk_build::{BuildContext, BuildSummary, BuildTask, Builder, OutputMode};

/// Build command arguments
#[derive(Default)]
pub struct BuildArgs {
    /// Print the plan without compiling
    pub dry_run: bool,
    /// Remove the output tree first
    pub clean: bool,
    /// Verbose output
    pub verbose: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
    /// JSON output
    pub json: bool,
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
    /// Output root override
    pub output_dir: Option<PathBuf>,
}

/// Run the build command
pub fn run(args: BuildArgs) -> Result<()> {
    let output_mode = determine_output_mode(&args);
    let builder = load_builder(args.project_dir.as_deref(), args.output_dir.as_deref())?
        .with_output_mode(output_mode);

    if args.dry_run {
        let plan = builder.plan().context("Failed to plan build")?;
        return print_plan(&builder, &plan, &args);
    }

    if args.clean {
        if output_mode != OutputMode::Json && !args.quiet {
            println!("Cleaning {}", builder.layout().root().display());
        }
        builder.clean().context("Failed to clean build output")?;
    }

    let context = builder.build().context("Build failed")?;

    if args.json {
        let summary = BuildSummary::from_context(&context);
        println!("{}", summary.to_json()?);
    } else if !args.quiet {
        print_summary(&context, args.verbose);
    }

    Ok(())
}

/// Determine output mode from arguments
fn determine_output_mode(args: &BuildArgs) -> OutputMode {
    if args.json {
        OutputMode::Json
    } else if args.quiet {
        OutputMode::Quiet
    } else if args.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    }
}

fn print_summary(context: &BuildContext, verbose: bool) {
    let stats = &context.stats;
    println!("\n{}", "=".repeat(60));
    println!(
        "{} in {:.2}s",
        "Build succeeded".green().bold(),
        stats.total_time.as_secs_f64()
    );
    println!("{}", "=".repeat(60));
    println!(
        "  Modules: {} compiled, {} up to date",
        stats.compiled_modules,
        stats.total_modules - stats.compiled_modules
    );
    println!("  Compiler runs: {}", context.report.executed.len());
    println!("  Output: {}", context.output_root.display());
    if verbose {
        println!("  Compilation: {:.2}s", stats.compilation_time.as_secs_f64());
        println!("  Assembly: {:.2}s", stats.assembly_time.as_secs_f64());
    }
    println!("{}", "=".repeat(60));
}

fn print_plan(builder: &Builder, plan: &[BuildTask], args: &BuildArgs) -> Result<()> {
    if args.json {
        let tasks: Vec<_> = plan
            .iter()
            .map(|task| {
                serde_json::json!({
                    "label": task.label(),
                    "kind": task.kind,
                    "modules": task.modules,
                    "library_paths": task.library_paths,
                    "entry_points": task.entry_points,
                    "reason": task.reason.describe(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "dry_run": true,
                "output_root": builder.layout().root(),
                "tasks": tasks,
            }))?
        );
        return Ok(());
    }

    if plan.is_empty() {
        if !args.quiet {
            println!("Everything is up to date");
        }
        return Ok(());
    }

    for task in plan {
        println!(
            "{:>12} {} ({})",
            "Would compile".cyan(),
            task.label(),
            task.reason.describe()
        );
        if args.verbose {
            for path in &task.library_paths {
                println!("{:>12} -L {}", "", path.display());
            }
            for entry in &task.entry_points {
                println!("{:>12} {}", "", entry.display());
            }
        }
    }
    Ok(())
}
