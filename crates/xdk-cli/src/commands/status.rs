//! Status command - per-module staleness

use super::load_builder;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use xdk_build::ModuleStatus;

/// Run the status command
pub fn run(project_dir: Option<&Path>, output_dir: Option<&Path>, json: bool) -> Result<()> {
    let builder = load_builder(project_dir, output_dir)?;
    let modules = builder.status().context("Failed to check module status")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "output_root": builder.layout().root(),
                "stale": stale_count(&modules),
                "modules": modules,
            }))?
        );
        return Ok(());
    }

    let width = modules.iter().map(|m| m.name.len()).max().unwrap_or(0);
    for module in &modules {
        let state = if module.staleness.is_stale() {
            module.staleness.describe().yellow()
        } else {
            module.staleness.describe().green()
        };
        println!(
            "{:<8} {:<width$}  {}",
            module.role.to_string(),
            module.name,
            state,
            width = width
        );
    }

    match stale_count(&modules) {
        0 => println!("\nAll {} modules up to date", modules.len()),
        n => println!("\n{} of {} modules need compiling", n, modules.len()),
    }
    Ok(())
}

fn stale_count(modules: &[ModuleStatus]) -> usize {
    modules.iter().filter(|m| m.staleness.is_stale()).count()
}
