use std::path::{Path, PathBuf};

/// Logical layout of a workspace on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    /// Root directory of the workspace.
    pub root: PathBuf,
    /// Directory for internal metadata (.exemap).
    pub meta_dir: PathBuf,
    /// Path to the workspace config file (JSON).
    pub config_path: PathBuf,
    /// Default path of the project document.
    pub document_path: PathBuf,
    /// Directory for exported reports (reports).
    pub reports_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Compute the default layout for a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".exemap");
        let config_path = meta_dir.join("config.json");
        let document_path = meta_dir.join("project.json");
        let reports_dir = root.join("reports");

        Self { root, meta_dir, config_path, document_path, reports_dir }
    }

    /// Document path string suitable for storing in `WorkspaceConfig`,
    /// relative to `root` when possible.
    pub fn document_path_relative_string(&self) -> String {
        match self.document_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.document_path.to_string_lossy().to_string(),
        }
    }

    /// Path of a named export inside `reports/`.
    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.reports_dir.join(file_name)
    }
}
