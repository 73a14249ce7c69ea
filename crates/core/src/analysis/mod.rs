//! Read-only analyses over a `Project`.
//!
//! Every function here recomputes from scratch over the current entities.
//! Projects are small (hundreds of sections/modules at most), so the simple
//! sweeps and pairwise scans below are fast enough and easy to check.

use std::fmt;

use serde::Serialize;

use crate::model::{Address, Module, ModuleId, ModuleRange, Project, SectionId};

/// Executable address space owned by no section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionHole {
    pub start: Address,
    pub end: Address,
}

impl SectionHole {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// Space inside a section that no module range claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleHole {
    pub section_id: SectionId,
    pub section_name: String,
    pub start: Address,
    pub end: Address,
}

impl ModuleHole {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// Two different modules claiming intersecting ranges in the same section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOverlap {
    pub section_id: SectionId,
    pub section_name: String,
    pub module_a: ModuleId,
    pub module_a_name: String,
    pub module_b: ModuleId,
    pub module_b_name: String,
    pub range_a: ModuleRange,
    pub range_b: ModuleRange,
    /// Number of addresses both ranges claim.
    pub size: u64,
}

impl ModuleOverlap {
    /// The shared interval `[start, end)`.
    pub fn span(&self) -> (Address, Address) {
        (self.range_a.start.max(self.range_b.start), self.range_a.end.min(self.range_b.end))
    }
}

/// Name and id of an entity found by an address lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: u32,
    pub name: String,
}

/// Result of asking which section and module own an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressLookup {
    pub address: Address,
    pub section: Option<NamedRef>,
    /// First module (by ascending id) whose range contains the address.
    pub module: Option<NamedRef>,
    /// Further modules claiming the same address (an overlap).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub also_claimed_by: Vec<NamedRef>,
}

impl AddressLookup {
    pub fn section_name(&self) -> Option<&str> {
        self.section.as_ref().map(|s| s.name.as_str())
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_ref().map(|m| m.name.as_str())
    }
}

impl fmt::Display for AddressLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.section, &self.module) {
            (None, _) => write!(f, "0x{:X}: address not in any section", self.address),
            (Some(sec), None) => write!(f, "0x{:X}: section '{}', no module", self.address, sec.name),
            (Some(sec), Some(module)) => {
                write!(f, "0x{:X}: section '{}', module '{}'", self.address, sec.name, module.name)?;
                if !self.also_claimed_by.is_empty() {
                    let others: Vec<&str> =
                        self.also_claimed_by.iter().map(|m| m.name.as_str()).collect();
                    write!(f, " (also claimed by {})", others.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Ownership state of a stretch of the executable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    /// Inside the executable range but in no section.
    Unmapped,
    /// Inside a section, claimed by no module.
    Hole,
    /// Claimed by exactly one module.
    Owned,
    /// Claimed by two or more modules.
    Overlap,
}

impl CoverageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageKind::Unmapped => "unmapped",
            CoverageKind::Hole => "hole",
            CoverageKind::Owned => "owned",
            CoverageKind::Overlap => "overlap",
        }
    }
}

/// A maximal run of addresses sharing one `CoverageKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageSegment {
    pub start: Address,
    pub end: Address,
    pub kind: CoverageKind,
}

impl CoverageSegment {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// One row of the by-section view: either a module's range or a gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutEntry {
    Range { module_id: ModuleId, module_name: String, range: ModuleRange },
    Gap { start: Address, end: Address },
}

impl LayoutEntry {
    pub fn start(&self) -> Address {
        match self {
            LayoutEntry::Range { range, .. } => range.start,
            LayoutEntry::Gap { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Address {
        match self {
            LayoutEntry::Range { range, .. } => range.end,
            LayoutEntry::Gap { end, .. } => *end,
        }
    }
}

/// A module's range annotated with the owning section's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRangeView {
    pub section_name: String,
    pub range: ModuleRange,
}

/// Headline numbers for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub section_count: usize,
    pub module_count: usize,
    pub range_count: usize,
    pub section_hole_count: usize,
    pub section_hole_bytes: u64,
    pub module_hole_count: usize,
    pub module_hole_bytes: u64,
    pub overlap_count: usize,
    pub overlap_bytes: u64,
}

/// Sweep `spans` (sorted by start) across `[lo, hi)` and return every
/// uncovered sub-interval in address order.
fn sweep_gaps(lo: Address, hi: Address, spans: &[(Address, Address)]) -> Vec<(Address, Address)> {
    let mut gaps = Vec::new();
    let mut cursor = lo;
    for &(start, end) in spans {
        if start > cursor {
            gaps.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < hi {
        gaps.push((cursor, hi));
    }
    gaps
}

/// Spans of module ranges inside `section_id`, sorted by start.
fn used_spans(project: &Project, section_id: SectionId) -> Vec<(Address, Address)> {
    let mut used: Vec<(Address, Address)> =
        project.ranges_in_section(section_id).map(|(_, r)| (r.start, r.end)).collect();
    used.sort_unstable();
    used
}

/// Executable address space owned by no section. Empty when the executable
/// range is unset.
pub fn section_holes(project: &Project) -> Vec<SectionHole> {
    let Some(exe) = project.exe_range else {
        return Vec::new();
    };
    let spans: Vec<(Address, Address)> =
        project.sections_by_start().iter().map(|s| (s.start, s.end)).collect();
    sweep_gaps(exe.start, exe.end, &spans)
        .into_iter()
        .map(|(start, end)| SectionHole { start, end })
        .collect()
}

/// Unclaimed space inside each section, sections ordered by start. A section
/// without any module range is reported as one hole spanning all of it.
pub fn module_holes(project: &Project) -> Vec<ModuleHole> {
    let mut holes = Vec::new();
    for section in project.sections_by_start() {
        let used = used_spans(project, section.id);
        for (start, end) in sweep_gaps(section.start, section.end, &used) {
            holes.push(ModuleHole {
                section_id: section.id,
                section_name: section.name.clone(),
                start,
                end,
            });
        }
    }
    holes
}

/// Every intersecting pair of ranges owned by different modules in the same
/// section, sorted by section start, then overlap start, then module ids.
pub fn module_overlaps(project: &Project) -> Vec<ModuleOverlap> {
    let modules: Vec<&Module> = project.modules.values().collect();
    let mut overlaps = Vec::new();

    for (i, a) in modules.iter().enumerate() {
        for b in &modules[i + 1..] {
            for range_a in &a.ranges {
                for range_b in &b.ranges {
                    let Some((lo, hi)) = range_a.intersection(range_b) else {
                        continue;
                    };
                    overlaps.push(ModuleOverlap {
                        section_id: range_a.section_id,
                        section_name: project.section_name(range_a.section_id),
                        module_a: a.id,
                        module_a_name: a.name.clone(),
                        module_b: b.id,
                        module_b_name: b.name.clone(),
                        range_a: range_a.clone(),
                        range_b: range_b.clone(),
                        size: hi - lo,
                    });
                }
            }
        }
    }

    overlaps.sort_by_key(|o| {
        let section_start = project.sections.get(&o.section_id).map_or(0, |s| s.start);
        (section_start, o.span().0, o.module_a, o.module_b)
    });
    overlaps
}

/// Which section, and which module within it, own `address`.
pub fn find_address(project: &Project, address: Address) -> AddressLookup {
    let mut lookup =
        AddressLookup { address, section: None, module: None, also_claimed_by: Vec::new() };

    let Some(section) = project.sections.values().find(|s| s.contains(address)) else {
        return lookup;
    };
    lookup.section = Some(NamedRef { id: section.id, name: section.name.clone() });

    let mut owners = project
        .ranges_in_section(section.id)
        .filter(|(_, r)| r.contains(address))
        .map(|(m, _)| NamedRef { id: m.id, name: m.name.clone() });
    lookup.module = owners.next();
    lookup.also_claimed_by = owners.collect();
    lookup
}

/// Partition the executable range into maximal runs of equal ownership.
///
/// Empty when the executable range is unset.
pub fn coverage_map(project: &Project) -> Vec<CoverageSegment> {
    let Some(exe) = project.exe_range else {
        return Vec::new();
    };

    // Every address where the classification may change.
    let mut cuts = vec![exe.start, exe.end];
    for section in project.sections.values() {
        cuts.extend([section.start, section.end]);
    }
    for module in project.modules.values() {
        for range in &module.ranges {
            cuts.extend([range.start, range.end]);
        }
    }
    cuts.retain(|&a| a >= exe.start && a <= exe.end);
    cuts.sort_unstable();
    cuts.dedup();

    let mut segments: Vec<CoverageSegment> = Vec::new();
    for pair in cuts.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let kind = classify(project, start);
        match segments.last_mut() {
            Some(last) if last.kind == kind && last.end == start => last.end = end,
            _ => segments.push(CoverageSegment { start, end, kind }),
        }
    }
    segments
}

/// Ownership of a single address. Constant between consecutive cut points.
fn classify(project: &Project, address: Address) -> CoverageKind {
    let Some(section) = project.sections.values().find(|s| s.contains(address)) else {
        return CoverageKind::Unmapped;
    };
    let claims = project
        .ranges_in_section(section.id)
        .filter(|(_, r)| r.contains(address))
        .count();
    match claims {
        0 => CoverageKind::Hole,
        1 => CoverageKind::Owned,
        _ => CoverageKind::Overlap,
    }
}

/// Module ranges in a section interleaved with the gaps between them, ordered
/// by start address. Unknown sections yield an empty layout.
pub fn section_layout(project: &Project, section_id: SectionId) -> Vec<LayoutEntry> {
    let Some(section) = project.sections.get(&section_id) else {
        return Vec::new();
    };

    let mut entries: Vec<LayoutEntry> = project
        .ranges_in_section(section_id)
        .map(|(m, r)| LayoutEntry::Range {
            module_id: m.id,
            module_name: m.name.clone(),
            range: r.clone(),
        })
        .collect();
    let used = used_spans(project, section_id);
    entries.extend(
        sweep_gaps(section.start, section.end, &used)
            .into_iter()
            .map(|(start, end)| LayoutEntry::Gap { start, end }),
    );
    entries.sort_by_key(|e| (e.start(), e.end()));
    entries
}

/// A module's ranges ordered by start address.
pub fn module_layout(project: &Project, module_id: ModuleId) -> Vec<ModuleRangeView> {
    let Some(module) = project.modules.get(&module_id) else {
        return Vec::new();
    };
    let mut views: Vec<ModuleRangeView> = module
        .ranges
        .iter()
        .map(|r| ModuleRangeView {
            section_name: project.section_name(r.section_id),
            range: r.clone(),
        })
        .collect();
    views.sort_by_key(|v| v.range.start);
    views
}

/// Modules that hold no range in `section_id` yet.
pub fn modules_without_range(project: &Project, section_id: SectionId) -> Vec<&Module> {
    project.modules.values().filter(|m| m.range_in(section_id).is_none()).collect()
}

pub fn summary(project: &Project) -> ProjectSummary {
    let section_holes = section_holes(project);
    let module_holes = module_holes(project);
    let overlaps = module_overlaps(project);

    ProjectSummary {
        section_count: project.sections.len(),
        module_count: project.modules.len(),
        range_count: project.modules.values().map(|m| m.ranges.len()).sum(),
        section_hole_count: section_holes.len(),
        section_hole_bytes: section_holes.iter().map(SectionHole::size).sum(),
        module_hole_count: module_holes.len(),
        module_hole_bytes: module_holes.iter().map(ModuleHole::size).sum(),
        overlap_count: overlaps.len(),
        overlap_bytes: overlaps.iter().map(|o| o.size).sum(),
    }
}

