use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::store::ProjectStore;
use crate::workspace::{open_store, WorkspaceConfig, WorkspaceLayout};

/// Convenience wrapper bundling layout, config, document path, and the loaded store.
#[derive(Debug)]
pub struct WorkspaceContext {
    pub layout: WorkspaceLayout,
    pub config: WorkspaceConfig,
    pub document_path: PathBuf,
    pub store: ProjectStore,
}

impl WorkspaceContext {
    /// Load workspace config and the project document for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = WorkspaceLayout::new(root);
        let (config, document_path, store) = open_store(&layout)?;
        Ok(Self { layout, config, document_path, store })
    }

    /// Persist the current project to the configured document path.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.document_path).with_context(|| {
            format!("Failed to save project document at {}", self.document_path.display())
        })
    }
}
