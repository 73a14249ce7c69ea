use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use exemap_core::analysis::{CoverageKind, CoverageSegment};
use exemap_core::model::{Address, ExeRange};

pub mod commands;
pub mod logging;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Infer a workspace name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-workspace`.
pub fn infer_workspace_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-workspace").to_string()
}

/// Parse a hexadecimal address.
///
/// Accepts `0x1000`, `1000h`, or bare `1000`, case-insensitive, with
/// surrounding whitespace and `_` digit separators ignored.
pub fn parse_address(text: &str) -> Result<Address> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Address value required."));
    }
    let mut digits = trimmed;
    if let Some(rest) = digits.strip_suffix('h').or_else(|| digits.strip_suffix('H')) {
        digits = rest;
    }
    if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        digits = rest;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!("Invalid hex address '{trimmed}'."));
    }
    Address::from_str_radix(&cleaned, 16).map_err(|_| anyhow!("Invalid hex address '{trimmed}'."))
}

/// Render an address (or size) the way every report shows it: `0x` + hex digits.
pub fn format_address(value: u64, uppercase: bool) -> String {
    if uppercase {
        format!("0x{value:X}")
    } else {
        format!("0x{value:x}")
    }
}

/// Character drawn for each coverage kind in the text bar.
pub fn coverage_glyph(kind: CoverageKind) -> char {
    match kind {
        CoverageKind::Unmapped => '.',
        CoverageKind::Hole => '-',
        CoverageKind::Owned => '#',
        CoverageKind::Overlap => '!',
    }
}

/// Draw the coverage map as a fixed-width text bar.
///
/// Each column stands for an equal slice of the executable range. When a
/// column spans several kinds, the most severe one wins
/// (overlap > hole > owned > unmapped) so small conflicts stay visible.
pub fn render_bar(exe: ExeRange, segments: &[CoverageSegment], width: usize) -> String {
    let width = width.max(1);
    let span = u128::from(exe.size());
    let mut bar = String::with_capacity(width);

    for column in 0..width as u128 {
        let lo = u128::from(exe.start) + span * column / width as u128;
        let hi = (u128::from(exe.start) + span * (column + 1) / width as u128).max(lo + 1);
        let kind = segments
            .iter()
            .filter(|s| u128::from(s.start) < hi && lo < u128::from(s.end))
            .map(|s| s.kind)
            .max_by_key(|k| severity(*k))
            .unwrap_or(CoverageKind::Unmapped);
        bar.push(coverage_glyph(kind));
    }
    bar
}

fn severity(kind: CoverageKind) -> u8 {
    match kind {
        CoverageKind::Unmapped => 0,
        CoverageKind::Owned => 1,
        CoverageKind::Hole => 2,
        CoverageKind::Overlap => 3,
    }
}
