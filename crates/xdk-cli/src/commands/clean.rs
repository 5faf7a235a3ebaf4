//! Clean command - remove the output tree
//!
//! Only the manifest's output settings are read, so a project whose module
//! graph is broken can still be cleaned.

use super::load_layout;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the clean command
pub fn run(project_dir: Option<&Path>, output_dir: Option<&Path>) -> Result<()> {
    let layout = load_layout(project_dir, output_dir)?;
    let root = layout.root().display().to_string();

    if layout.clean().context("Failed to clean build output")? {
        tracing::info!(path = %root, "output removed");
        println!("Removed {}", root);
    } else {
        println!("Nothing to clean at {}", root);
    }
    Ok(())
}
