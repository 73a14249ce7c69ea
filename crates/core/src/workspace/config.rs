use serde::{Deserialize, Serialize};

/// Where the project document lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Path to the project document (typically relative to the workspace root).
    pub path: String,
}

impl DocumentConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Presentation options for reports and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Render addresses as `0xABCD` (true) or `0xabcd` (false).
    #[serde(default = "default_uppercase_hex")]
    pub uppercase_hex: bool,
}

fn default_uppercase_hex() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { uppercase_hex: default_uppercase_hex() }
    }
}

/// Serializable configuration describing an exemap workspace.
///
/// This lives at `.exemap/config.json` in the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Human-friendly workspace name (usually the executable's name).
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version. This is about the config file, not the project document.
    pub config_version: String,
    /// Project document location.
    pub document: DocumentConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl WorkspaceConfig {
    /// Create a new workspace configuration using the given name and document path.
    pub fn new(name: impl Into<String>, document_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            document: DocumentConfig::new(document_path),
            report: ReportConfig::default(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}
