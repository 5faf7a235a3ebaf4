use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// XDK build tool.
///
/// Builds the core library, the native bridge and every library module of an
/// XDK project, recompiling only modules whose sources changed, then
/// assembles the distributable output tree.
///
/// EXAMPLES:
///     xdk build                    Build the project in the current directory
///     xdk build --dry-run          Show what would be compiled
///     xdk status                   Show which modules are stale
///     xdk clean                    Remove the output tree
///
/// ENVIRONMENT VARIABLES:
///     XDK_OUTPUT_DIR    Output root (overrides xdk.toml)
///     XDK_COMPILER      Compiler program (overrides xdk.toml)
///     XDK_VERBOSE       Pass -verbose to the compiler (true/false)
///     XDK_JSON          Set to '1' for JSON output by default
///     XDK_LOG           Log filter, e.g. 'xdk_build=debug'
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "xdk")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    ///
    /// Compiles the core and bridge together when either is stale, then
    /// every stale library module in dependency order, and assembles the
    /// output tree. Stops at the first failing module.
    ///
    /// EXAMPLES:
    ///     xdk build                     Incremental build
    ///     xdk build --clean             Remove the output tree first
    ///     xdk build --dry-run --json    Print the plan as JSON
    ///     xdk build --output /tmp/xdk   Build into another directory
    #[command(visible_alias = "b")]
    Build {
        /// Print the compile plan without running the compiler
        #[arg(long, short = 'n')]
        dry_run: bool,
        /// Remove the output tree before building
        #[arg(long)]
        clean: bool,
        /// Verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Quiet output (errors only)
        #[arg(long, short = 'q', conflicts_with = "verbose")]
        quiet: bool,
        /// JSON output
        #[arg(long, env = "XDK_JSON")]
        json: bool,
        /// Project directory (defaults to the current directory)
        #[arg(long, short = 'p')]
        project: Option<PathBuf>,
        /// Output root (overrides xdk.toml and XDK_OUTPUT_DIR)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Remove the output tree
    ///
    /// EXAMPLES:
    ///     xdk clean
    ///     xdk clean --output /tmp/xdk
    Clean {
        /// Project directory (defaults to the current directory)
        #[arg(long, short = 'p')]
        project: Option<PathBuf>,
        /// Output root (overrides xdk.toml and XDK_OUTPUT_DIR)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show which modules are stale
    ///
    /// EXAMPLES:
    ///     xdk status
    ///     xdk status --json
    #[command(visible_alias = "st")]
    Status {
        /// Project directory (defaults to the current directory)
        #[arg(long, short = 'p')]
        project: Option<PathBuf>,
        /// Output root (overrides xdk.toml and XDK_OUTPUT_DIR)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// JSON output
        #[arg(long, env = "XDK_JSON")]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    let verbose = matches!(cli.command, Commands::Build { verbose: true, .. });
    init_logging(verbose);

    if cli_config.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Build {
            dry_run,
            clean,
            verbose,
            quiet,
            json,
            project,
            output,
        } => {
            let args = commands::build::BuildArgs {
                dry_run,
                clean,
                verbose,
                quiet,
                json: json || cli_config.default_json,
                project_dir: project,
                output_dir: output,
            };
            commands::build::run(args)?;
        }
        Commands::Clean { project, output } => {
            commands::clean::run(project.as_deref(), output.as_deref())?;
        }
        Commands::Status {
            project,
            output,
            json,
        } => {
            commands::status::run(
                project.as_deref(),
                output.as_deref(),
                json || cli_config.default_json,
            )?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber; logs go to stderr
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = EnvFilter::from_env("XDK_LOG").add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
