use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::store::ProjectStore;
use crate::workspace::{WorkspaceConfig, WorkspaceLayout};

/// Load the workspace config JSON from disk for a given layout.
pub fn load_workspace_config(layout: &WorkspaceLayout) -> Result<WorkspaceConfig> {
    let config_json = std::fs::read_to_string(&layout.config_path).with_context(|| {
        format!("Failed to read workspace config at {}", layout.config_path.display())
    })?;
    let config: WorkspaceConfig =
        serde_json::from_str(&config_json).context("Failed to parse workspace config JSON")?;
    Ok(config)
}

/// Resolve the document path from config (relative paths are joined to the root).
pub fn resolve_document_path(layout: &WorkspaceLayout, config: &WorkspaceConfig) -> PathBuf {
    let configured = std::path::Path::new(&config.document.path);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        layout.root.join(configured)
    }
}

/// Load config and the project document for a workspace.
///
/// A missing document yields an empty project; an unreadable or invalid one
/// is an error, so callers never overwrite a document they failed to parse.
pub fn open_store(layout: &WorkspaceLayout) -> Result<(WorkspaceConfig, PathBuf, ProjectStore)> {
    let config = load_workspace_config(layout)?;
    let document_path = resolve_document_path(layout, &config);

    let mut store = ProjectStore::new();
    if document_path.exists() {
        store.load(&document_path).with_context(|| {
            format!("Failed to load project document at {}", document_path.display())
        })?;
    }
    Ok((config, document_path, store))
}
