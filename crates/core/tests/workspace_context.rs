use std::fs;

use exemap_core::store::ProjectStore;
use exemap_core::workspace::{
    load_workspace_config, open_store, resolve_document_path, WorkspaceConfig, WorkspaceContext,
    WorkspaceLayout,
};
use tempfile::tempdir;

fn write_config(layout: &WorkspaceLayout, config: &WorkspaceConfig) {
    fs::create_dir_all(&layout.meta_dir).unwrap();
    fs::write(&layout.config_path, serde_json::to_string_pretty(config).unwrap()).unwrap();
}

#[test]
fn layout_paths_hang_off_the_root() {
    let root = tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());

    assert!(layout.meta_dir.ends_with(".exemap"));
    assert!(layout.config_path.ends_with(".exemap/config.json"));
    assert!(layout.document_path.ends_with(".exemap/project.json"));
    assert!(layout.report_path("overlaps.csv").ends_with("reports/overlaps.csv"));
    assert!(layout.document_path_relative_string().starts_with(".exemap"));
}

#[test]
fn config_defaults_report_section_when_missing() {
    let raw = r#"{
        "name": "game",
        "description": null,
        "config_version": "0.1.0",
        "document": { "path": ".exemap/project.json" }
    }"#;
    let config: WorkspaceConfig = serde_json::from_str(raw).unwrap();
    assert!(config.report.uppercase_hex);
    assert_eq!(config.document.path, ".exemap/project.json");
}

#[test]
fn document_path_resolution_handles_relative_and_absolute() {
    let root = tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());

    let relative = WorkspaceConfig::new("game", "maps/game.json");
    assert_eq!(resolve_document_path(&layout, &relative), root.path().join("maps/game.json"));

    let absolute_path = root.path().join("elsewhere.json");
    let absolute = WorkspaceConfig::new("game", absolute_path.to_string_lossy());
    assert_eq!(resolve_document_path(&layout, &absolute), absolute_path);
}

#[test]
fn missing_config_is_an_error() {
    let root = tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());
    let err = load_workspace_config(&layout).unwrap_err();
    assert!(err.to_string().contains("Failed to read workspace config"));
}

#[test]
fn open_store_starts_empty_without_a_document() {
    let root = tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());
    write_config(&layout, &WorkspaceConfig::new("game", layout.document_path_relative_string()));

    let (config, document_path, store) = open_store(&layout).unwrap();
    assert_eq!(config.name, "game");
    assert_eq!(document_path, layout.document_path);
    assert!(store.project().sections.is_empty());
}

#[test]
fn open_store_refuses_a_broken_document() {
    let root = tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());
    write_config(&layout, &WorkspaceConfig::new("game", layout.document_path_relative_string()));
    fs::write(&layout.document_path, "not json").unwrap();

    let err = open_store(&layout).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load project document"));
    // The broken document is left as-is.
    assert_eq!(fs::read_to_string(&layout.document_path).unwrap(), "not json");
}

#[test]
fn context_save_then_reload() {
    let root = tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());
    write_config(
        &layout,
        &WorkspaceConfig::new("game", layout.document_path_relative_string())
            .with_description(Some("retail build".into())),
    );

    let mut ctx = WorkspaceContext::from_root(root.path()).unwrap();
    assert_eq!(ctx.config.description.as_deref(), Some("retail build"));
    ctx.store.add_section(".text", 0x1000, 0x2000, false).unwrap();
    ctx.save().unwrap();

    let reopened = WorkspaceContext::from_root(root.path()).unwrap();
    assert_eq!(reopened.store.project(), ctx.store.project());

    let mut direct = ProjectStore::new();
    direct.load(&reopened.document_path).unwrap();
    assert_eq!(direct.find_section_by_name(".text").map(|s| s.id), Some(1));
}
