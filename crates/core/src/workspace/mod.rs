//! On-disk workspace layout and configuration.
//!
//! A workspace is a directory holding:
//! - `.exemap/config.json`: serializable workspace metadata (`WorkspaceConfig`).
//! - the project document (by default `.exemap/project.json`).
//! - `reports/`: where CSV exports land.
//!
//! Types here compute paths and load/save files; all project semantics live in
//! `crate::store`.

pub mod config;
pub mod context;
pub mod layout;
pub mod util;

pub use config::{DocumentConfig, ReportConfig, WorkspaceConfig};
pub use context::WorkspaceContext;
pub use layout::WorkspaceLayout;
pub use util::{load_workspace_config, open_store, resolve_document_path};
