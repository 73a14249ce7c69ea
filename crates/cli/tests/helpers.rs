use std::path::Path;

use exemap::logging::{build_env_filter, LogConfig};
use exemap::{
    canonicalize_or_current, format_address, infer_workspace_name, parse_address, render_bar,
};
use exemap_core::analysis::{CoverageKind, CoverageSegment};
use exemap_core::model::ExeRange;
use tempfile::tempdir;
use tracing::Level;

#[test]
fn canonicalize_or_current_handles_existing_and_missing_paths() {
    let tmp = tempdir().expect("tempdir");
    let existing = canonicalize_or_current(&tmp.path().to_string_lossy()).expect("canonicalize");
    assert_eq!(existing, tmp.path().canonicalize().expect("canon tmp"));

    let missing = tmp.path().join("not-yet-created");
    let resolved = canonicalize_or_current(&missing.to_string_lossy()).expect("resolve missing");
    assert!(resolved.ends_with("not-yet-created"));
    assert!(resolved.is_absolute());
}

#[test]
fn infer_workspace_name_uses_last_path_component() {
    assert_eq!(infer_workspace_name(Path::new("/tmp/game-retail")), "game-retail");
    assert_eq!(infer_workspace_name(Path::new("/")), "unnamed-workspace");
}

#[test]
fn parse_address_accepts_common_hex_spellings() {
    assert_eq!(parse_address("0x401000").unwrap(), 0x401000);
    assert_eq!(parse_address("0X40AbCd").unwrap(), 0x40ABCD);
    assert_eq!(parse_address("401000h").unwrap(), 0x401000);
    assert_eq!(parse_address("401000H").unwrap(), 0x401000);
    assert_eq!(parse_address("  ff  ").unwrap(), 0xFF);
    assert_eq!(parse_address("0x0040_1000").unwrap(), 0x401000);
}

#[test]
fn parse_address_rejects_garbage() {
    let err = parse_address("").unwrap_err();
    assert_eq!(err.to_string(), "Address value required.");
    assert!(parse_address("0x").is_err());
    assert!(parse_address("h").is_err());
    let err = parse_address("0xZZ").unwrap_err();
    assert!(err.to_string().contains("Invalid hex address '0xZZ'"));
    assert!(parse_address("-10").is_err());
    assert!(parse_address("+10").is_err());
    assert!(parse_address("0x+10").is_err());
    assert!(parse_address("+10h").is_err());
    assert!(parse_address("0x1_0000_0000_0000_0000").is_err());
}

#[test]
fn format_address_honors_case() {
    assert_eq!(format_address(0xABCD, true), "0xABCD");
    assert_eq!(format_address(0xABCD, false), "0xabcd");
    assert_eq!(format_address(0, true), "0x0");
}

fn seg(start: u64, end: u64, kind: CoverageKind) -> CoverageSegment {
    CoverageSegment { start, end, kind }
}

#[test]
fn render_bar_maps_segments_to_columns() {
    let exe = ExeRange::new(0, 0x100);
    let segments = [
        seg(0x00, 0x40, CoverageKind::Unmapped),
        seg(0x40, 0x80, CoverageKind::Owned),
        seg(0x80, 0xC0, CoverageKind::Hole),
        seg(0xC0, 0x100, CoverageKind::Overlap),
    ];
    assert_eq!(render_bar(exe, &segments, 4), ".#-!");
    assert_eq!(render_bar(exe, &segments, 8), "..##--!!");
}

#[test]
fn render_bar_keeps_small_conflicts_visible() {
    let exe = ExeRange::new(0x1000, 0x2000);
    let segments = [
        seg(0x1000, 0x1800, CoverageKind::Owned),
        seg(0x1800, 0x1801, CoverageKind::Overlap),
        seg(0x1801, 0x2000, CoverageKind::Owned),
    ];
    let bar = render_bar(exe, &segments, 4);
    assert_eq!(bar, "##!#");

    // Width zero still yields one column.
    assert_eq!(render_bar(exe, &segments, 0), "!");
    assert_eq!(render_bar(exe, &[], 3), "...");
}

#[test]
fn log_config_maps_verbosity_to_levels() {
    assert_eq!(LogConfig::default().level, Level::WARN);
    assert_eq!(LogConfig::from_verbosity(0).level, Level::WARN);
    assert_eq!(LogConfig::from_verbosity(1).level, Level::INFO);
    assert_eq!(LogConfig::from_verbosity(2).level, Level::DEBUG);
    assert_eq!(LogConfig::from_verbosity(9).level, Level::TRACE);
    assert!(!LogConfig::from_verbosity(1).with_ansi(false).with_ansi);

    // Building a filter never fails, with or without RUST_LOG.
    let _ = build_env_filter(Level::DEBUG);
}
