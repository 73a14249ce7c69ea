use std::path::Path;

use anyhow::{anyhow, Context, Result};
use exemap_core::model::{Module, ModuleId, Section, SectionId};
use exemap_core::store::ProjectStore;
use exemap_core::workspace::{WorkspaceContext, WorkspaceLayout};
use tracing::{debug, info};

use crate::canonicalize_or_current;

/// Resolve `root` and load the workspace (config + project document).
pub fn open_workspace(root: &str) -> Result<WorkspaceContext> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = WorkspaceContext::from_root(&root_path)?;
    if ctx.document_path.exists() {
        debug!(document = %ctx.document_path.display(), "loaded project document");
    } else {
        tracing::warn!(
            document = %ctx.document_path.display(),
            "no project document yet, starting from an empty project"
        );
    }
    Ok(ctx)
}

/// Apply a mutation to the workspace project and save it on success.
///
/// Nothing is written when the mutation is rejected.
pub fn mutate_workspace<T>(
    root: &str,
    action: &str,
    mutation: impl FnOnce(&mut ProjectStore) -> Result<T>,
) -> Result<(WorkspaceContext, T)> {
    let mut ctx = open_workspace(root)?;
    debug!(action, "applying mutation");
    let value = mutation(&mut ctx.store)?;
    ctx.save()?;
    info!(action, document = %ctx.document_path.display(), "saved project document");
    Ok((ctx, value))
}

/// Parse an `#<id>` reference.
fn parse_id_ref(reference: &str) -> Result<Option<u32>> {
    match reference.trim().strip_prefix('#') {
        Some(digits) => {
            let id = digits
                .parse::<u32>()
                .with_context(|| format!("Invalid id reference '{reference}'"))?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Find a section by `#<id>` or exact name.
pub fn resolve_section<'a>(store: &'a ProjectStore, reference: &str) -> Result<&'a Section> {
    match parse_id_ref(reference)? {
        Some(id) => Ok(store.section(id)?),
        None => store
            .find_section_by_name(reference.trim())
            .ok_or_else(|| anyhow!("No section named '{}'", reference.trim())),
    }
}

pub fn resolve_section_id(store: &ProjectStore, reference: &str) -> Result<SectionId> {
    Ok(resolve_section(store, reference)?.id)
}

/// Find a module by `#<id>` or name (case-insensitive).
pub fn resolve_module<'a>(store: &'a ProjectStore, reference: &str) -> Result<&'a Module> {
    match parse_id_ref(reference)? {
        Some(id) => Ok(store.module(id)?),
        None => store
            .find_module_by_name(reference)
            .ok_or_else(|| anyhow!("No module named '{}'", reference.trim())),
    }
}

pub fn resolve_module_id(store: &ProjectStore, reference: &str) -> Result<ModuleId> {
    Ok(resolve_module(store, reference)?.id)
}

/// Address formatter honoring the workspace's hex case preference.
pub fn hex_for(ctx: &WorkspaceContext) -> impl Fn(u64) -> String {
    let uppercase = ctx.config.report.uppercase_hex;
    move |value| crate::format_address(value, uppercase)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Ensure the reports directory exists.
pub fn ensure_reports_dir(layout: &WorkspaceLayout) -> Result<()> {
    std::fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })
}
