use std::fs;

use anyhow::{Context, Result};
use exemap_core::analysis::ProjectSummary;
use exemap_core::model::ExeRange;
use exemap_core::workspace::{WorkspaceConfig, WorkspaceLayout};
use serde::Serialize;
use tracing::info;

use crate::commands::{hex_for, mutate_workspace, open_workspace, print_dir_status};
use crate::{canonicalize_or_current, infer_workspace_name, parse_address};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub description: Option<String>,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub document_path: String,
    pub exe_range: Option<ExeRange>,
    pub summary: ProjectSummary,
}

/// Initialize a new workspace at `root`.
pub fn init_project_command(
    root: &str,
    name: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = WorkspaceLayout::new(&root_path);

    // Derive workspace name if not provided.
    let workspace_name = match name {
        Some(n) => n,
        None => infer_workspace_name(&root_path),
    };

    // Ensure directories exist.
    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    let config = WorkspaceConfig::new(&workspace_name, layout.document_path_relative_string())
        .with_description(description);

    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.config_path, json).with_context(|| {
        format!("Failed to write workspace config: {}", layout.config_path.display())
    })?;

    // Write an empty project right away unless one is already there, so
    // follow-on commands always find a document.
    if !layout.document_path.exists() {
        exemap_core::store::ProjectStore::new().save(&layout.document_path).with_context(|| {
            format!("Failed to write project document at {}", layout.document_path.display())
        })?;
    }
    info!(root = %layout.root.display(), "initialized workspace");

    println!("Initialized exemap workspace:");
    println!("  Name: {}", workspace_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.config_path.display());
    println!("  Document (relative): {}", config.document.path);
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing workspace.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_workspace(root)?;
    let project = ctx.store.project();
    let summary = ctx.store.summary();

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: ctx.config.name.clone(),
            description: ctx.config.description.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            document_path: ctx.document_path.display().to_string(),
            exe_range: project.exe_range,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let hex = hex_for(&ctx);
    println!("exemap Workspace Info");
    println!("=====================");
    println!("Name: {}", ctx.config.name);
    if let Some(desc) = &ctx.config.description {
        println!("Description: {}", desc);
    }
    println!("Root: {}", ctx.layout.root.display());
    println!("Config file: {}", ctx.layout.config_path.display());
    println!("Config version: {}", ctx.config.config_version);
    println!("Document: {}", ctx.document_path.display());
    match project.exe_range {
        Some(exe) => println!("Executable range: {} - {}", hex(exe.start), hex(exe.end)),
        None => println!("Executable range: (not set)"),
    }
    println!();

    println!("Directories:");
    print_dir_status("Meta dir (.exemap)", &ctx.layout.meta_dir);
    print_dir_status("Reports dir", &ctx.layout.reports_dir);
    println!();

    println!("Sections: {}", summary.section_count);
    println!("Modules: {} ({} ranges)", summary.module_count, summary.range_count);
    println!(
        "Unsectioned space: {} holes, {} bytes",
        summary.section_hole_count,
        hex(summary.section_hole_bytes)
    );
    println!(
        "Unclaimed section space: {} holes, {} bytes",
        summary.module_hole_count,
        hex(summary.module_hole_bytes)
    );
    println!("Module overlaps: {} ({} bytes)", summary.overlap_count, hex(summary.overlap_bytes));

    Ok(())
}

/// Set the executable range.
pub fn set_exe_range_command(root: &str, start: &str, end: &str) -> Result<()> {
    let start = parse_address(start)?;
    let end = parse_address(end)?;
    let (ctx, ()) = mutate_workspace(root, "set-exe-range", |store| {
        Ok(store.set_executable_range(start, end)?)
    })?;
    let hex = hex_for(&ctx);
    println!("Executable range set: {} - {}", hex(start), hex(end));
    Ok(())
}

/// Remove the executable range.
pub fn clear_exe_range_command(root: &str) -> Result<()> {
    mutate_workspace(root, "clear-exe-range", |store| {
        store.clear_executable_range();
        Ok(())
    })?;
    println!("Executable range cleared.");
    Ok(())
}
