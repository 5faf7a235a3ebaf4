pub mod build;
pub mod clean;
pub mod status;

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use xdk_build::{Builder, OutputLayout};
use xdk_config::{Config, ConfigLoader, MANIFEST_FILE};

/// Load the builder for a project, applying an output root override
pub fn load_builder(project_dir: Option<&Path>, output_dir: Option<&Path>) -> Result<Builder> {
    let cwd = env::current_dir().context("Failed to read current directory")?;
    let config = load_config(&cwd, project_dir)?;

    let builder = Builder::from_config(&config).with_context(|| {
        format!(
            "Invalid project in {}",
            config.project_root().join(MANIFEST_FILE).display()
        )
    })?;

    Ok(match output_dir {
        Some(dir) => builder.with_output_root(cwd.join(dir)),
        None => builder,
    })
}

/// Output layout of a project without building its module graph
pub fn load_layout(project_dir: Option<&Path>, output_dir: Option<&Path>) -> Result<OutputLayout> {
    let cwd = env::current_dir().context("Failed to read current directory")?;
    let root = match output_dir {
        Some(dir) => cwd.join(dir),
        None => load_config(&cwd, project_dir)?.output_root(),
    };
    Ok(OutputLayout::new(root))
}

fn load_config(cwd: &Path, project_dir: Option<&Path>) -> Result<Config> {
    let project_dir: PathBuf = project_dir.map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir));
    ConfigLoader::new()
        .load_from_directory(&project_dir)
        .with_context(|| {
            format!(
                "Failed to load {} from {}",
                MANIFEST_FILE,
                project_dir.display()
            )
        })
}
