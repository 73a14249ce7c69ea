use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use exemap_core::analysis::{
    CoverageSegment, ModuleHole, ModuleOverlap, ProjectSummary, SectionHole,
};
use serde::Serialize;
use tracing::info;

use crate::commands::{ensure_reports_dir, hex_for, open_workspace};
use crate::{parse_address, render_bar};

/// Which analysis to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Executable space covered by no section.
    SectionHoles,
    /// Section space claimed by no module.
    ModuleHoles,
    /// Module ranges claiming the same addresses.
    Overlaps,
    /// The executable range split into unmapped/hole/owned/overlap runs.
    Coverage,
    /// Headline counts.
    Summary,
}

/// Output encoding for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Yaml,
    Csv,
}

/// Header row plus display rows, shared by text and CSV output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Render as aligned plain-text columns.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let format_row = |cells: Vec<&str>| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut out = String::new();
        out.push_str(&format_row(self.headers.clone()));
        out.push('\n');
        if self.rows.is_empty() {
            out.push_str("(none)\n");
        }
        for row in &self.rows {
            out.push_str(&format_row(row.iter().map(String::as_str).collect()));
            out.push('\n');
        }
        out
    }

    /// Render as CSV: the header row, then one record per row.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers).context("Failed to write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("Failed to write CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| anyhow!("Failed to flush CSV output: {}", err.error()))?;
        String::from_utf8(bytes).context("CSV output was not UTF-8")
    }
}

pub fn section_holes_table(holes: &[SectionHole], hex: &dyn Fn(u64) -> String) -> ReportTable {
    ReportTable {
        headers: vec!["Start", "End", "Size"],
        rows: holes.iter().map(|h| vec![hex(h.start), hex(h.end), hex(h.size())]).collect(),
    }
}

pub fn module_holes_table(holes: &[ModuleHole], hex: &dyn Fn(u64) -> String) -> ReportTable {
    ReportTable {
        headers: vec!["Section", "Start", "End", "Size"],
        rows: holes
            .iter()
            .map(|h| vec![h.section_name.clone(), hex(h.start), hex(h.end), hex(h.size())])
            .collect(),
    }
}

pub fn overlaps_table(overlaps: &[ModuleOverlap], hex: &dyn Fn(u64) -> String) -> ReportTable {
    ReportTable {
        headers: vec![
            "Section",
            "Module A",
            "A Start",
            "A End",
            "Module B",
            "B Start",
            "B End",
            "Overlap Size",
        ],
        rows: overlaps
            .iter()
            .map(|o| {
                vec![
                    o.section_name.clone(),
                    o.module_a_name.clone(),
                    hex(o.range_a.start),
                    hex(o.range_a.end),
                    o.module_b_name.clone(),
                    hex(o.range_b.start),
                    hex(o.range_b.end),
                    hex(o.size),
                ]
            })
            .collect(),
    }
}

pub fn coverage_table(segments: &[CoverageSegment], hex: &dyn Fn(u64) -> String) -> ReportTable {
    ReportTable {
        headers: vec!["Start", "End", "Size", "Kind"],
        rows: segments
            .iter()
            .map(|s| vec![hex(s.start), hex(s.end), hex(s.size()), s.kind.as_str().to_string()])
            .collect(),
    }
}

pub fn summary_table(summary: &ProjectSummary, hex: &dyn Fn(u64) -> String) -> ReportTable {
    let rows = vec![
        ("Sections", summary.section_count.to_string()),
        ("Modules", summary.module_count.to_string()),
        ("Module ranges", summary.range_count.to_string()),
        ("Section holes", summary.section_hole_count.to_string()),
        ("Section hole bytes", hex(summary.section_hole_bytes)),
        ("Module holes", summary.module_hole_count.to_string()),
        ("Module hole bytes", hex(summary.module_hole_bytes)),
        ("Overlaps", summary.overlap_count.to_string()),
        ("Overlap bytes", hex(summary.overlap_bytes)),
    ];
    ReportTable {
        headers: vec!["Metric", "Value"],
        rows: rows.into_iter().map(|(k, v)| vec![k.to_string(), v]).collect(),
    }
}

fn render<T: Serialize + ?Sized>(
    format: ReportFormat,
    data: &T,
    table: impl FnOnce() -> ReportTable,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(table().to_text()),
        ReportFormat::Csv => table().to_csv(),
        ReportFormat::Json => {
            let mut json = serde_json::to_string_pretty(data)?;
            json.push('\n');
            Ok(json)
        }
        ReportFormat::Yaml => Ok(serde_yaml::to_string(data)?),
    }
}

/// Compute one report and print it (or write it to `out`).
pub fn report_command(
    root: &str,
    kind: ReportKind,
    format: ReportFormat,
    out: Option<&str>,
) -> Result<()> {
    let ctx = open_workspace(root)?;
    let store = &ctx.store;
    let hex = hex_for(&ctx);

    let body = match kind {
        ReportKind::SectionHoles => {
            let holes = store.compute_section_holes();
            render(format, &holes, || section_holes_table(&holes, &hex))?
        }
        ReportKind::ModuleHoles => {
            let holes = store.compute_module_holes();
            render(format, &holes, || module_holes_table(&holes, &hex))?
        }
        ReportKind::Overlaps => {
            let overlaps = store.compute_module_overlaps();
            render(format, &overlaps, || overlaps_table(&overlaps, &hex))?
        }
        ReportKind::Coverage => {
            let segments = store.coverage_map();
            render(format, &segments, || coverage_table(&segments, &hex))?
        }
        ReportKind::Summary => {
            let summary = store.summary();
            render(format, &summary, || summary_table(&summary, &hex))?
        }
    };

    match out {
        Some(path) => {
            let path = Path::new(path);
            fs::write(path, &body)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(report = ?kind, path = %path.display(), "wrote report");
            println!("Wrote {:?} report to {}", kind, path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

/// Export the three editor tables (section holes, module holes, overlaps) as
/// CSV files under `reports/`.
pub fn export_reports_command(root: &str) -> Result<()> {
    let ctx = open_workspace(root)?;
    let store = &ctx.store;
    let hex = hex_for(&ctx);
    ensure_reports_dir(&ctx.layout)?;

    let tables = [
        ("section_holes.csv", section_holes_table(&store.compute_section_holes(), &hex)),
        ("module_holes.csv", module_holes_table(&store.compute_module_holes(), &hex)),
        ("overlaps.csv", overlaps_table(&store.compute_module_overlaps(), &hex)),
    ];

    println!("Exported reports:");
    for (file_name, table) in tables {
        let path = ctx.layout.report_path(file_name);
        fs::write(&path, table.to_csv()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = table.rows.len(), "exported CSV");
        println!("- {} ({} rows + header)", path.display(), table.rows.len());
    }
    Ok(())
}

/// Report which section and module own an address.
pub fn where_command(root: &str, address: &str, json: bool) -> Result<()> {
    let address = parse_address(address)?;
    let ctx = open_workspace(root)?;
    let lookup = ctx.store.find_address(address);

    if json {
        println!("{}", serde_json::to_string_pretty(&lookup)?);
    } else {
        println!("{lookup}");
    }
    Ok(())
}

/// Draw the coverage map as a text bar.
pub fn bar_command(root: &str, width: usize) -> Result<()> {
    let ctx = open_workspace(root)?;
    let Some(exe) = ctx.store.project().exe_range else {
        println!("No executable range defined.");
        return Ok(());
    };
    let hex = hex_for(&ctx);
    let segments = ctx.store.coverage_map();
    let bar = render_bar(exe, &segments, width);

    println!("[{bar}]");
    let start_label = hex(exe.start);
    let end_label = hex(exe.end);
    let pad = (bar.chars().count() + 2).saturating_sub(start_label.len() + end_label.len());
    println!("{start_label}{}{end_label}", " ".repeat(pad));
    println!("Legend: '.' unmapped  '-' module hole  '#' owned  '!' overlap");
    Ok(())
}
