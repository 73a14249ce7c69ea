//! Core data model for an executable's address map.
//!
//! The model is a two-level partition of a flat address space:
//! - `Section`: a named, non-overlapping sub-interval of the executable range.
//! - `Module`: a named component claiming at most one `ModuleRange` per section.
//! - `Project`: the aggregate root holding the executable bounds, all sections
//!   and modules, and the id counters used to mint new identifiers.
//!
//! Entities never point at each other directly; module ranges refer to their
//! section through a `SectionId` and every lookup goes through the `Project` maps.
//! All intervals are half-open: `[start, end)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a section. Minted by the store, never reused.
pub type SectionId = u32;

/// Identifier of a module. Minted by the store, never reused.
pub type ModuleId = u32;

/// An unsigned address within the executable's address space.
pub type Address = u64;

/// First identifier handed out by a fresh project.
pub const FIRST_ID: u32 = 1;

/// Returns true when the half-open intervals `[a_start, a_end)` and
/// `[b_start, b_end)` share at least one address. Touching is not overlap.
pub fn intervals_overlap(a_start: Address, a_end: Address, b_start: Address, b_end: Address) -> bool {
    a_start < b_end && b_start < a_end
}

/// Overall address span that every section must fit inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExeRange {
    pub start: Address,
    pub end: Address,
}

impl ExeRange {
    pub fn new(start: Address, end: Address) -> Self {
        Self { start, end }
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// True if `[start, end)` lies completely inside this range.
    pub fn covers(&self, start: Address, end: Address) -> bool {
        start >= self.start && end <= self.end
    }
}

/// A named, non-overlapping sub-interval of the executable range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub start: Address,
    pub end: Address,
    #[serde(default)]
    pub locked: bool,
}

impl Section {
    pub fn new(id: SectionId, name: impl Into<String>, start: Address, end: Address) -> Self {
        Self { id, name: name.into(), start, end, locked: false }
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn contains(&self, address: Address) -> bool {
        self.start <= address && address < self.end
    }

    /// True if `[start, end)` fits inside this section's bounds.
    pub fn encloses(&self, start: Address, end: Address) -> bool {
        self.start <= start && start < end && end <= self.end
    }

    pub fn overlaps(&self, start: Address, end: Address) -> bool {
        intervals_overlap(self.start, self.end, start, end)
    }
}

/// One module's claimed interval within one specific section.
///
/// A range has no identity of its own; it is addressed by
/// `(owning module, section_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRange {
    pub section_id: SectionId,
    pub start: Address,
    pub end: Address,
    #[serde(default)]
    pub locked: bool,
}

impl ModuleRange {
    pub fn new(section_id: SectionId, start: Address, end: Address) -> Self {
        Self { section_id, start, end, locked: false }
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn contains(&self, address: Address) -> bool {
        self.start <= address && address < self.end
    }

    /// Shared sub-interval with `other`, if both ranges sit in the same
    /// section and intersect.
    pub fn intersection(&self, other: &ModuleRange) -> Option<(Address, Address)> {
        if self.section_id != other.section_id
            || !intervals_overlap(self.start, self.end, other.start, other.end)
        {
            return None;
        }
        Some((self.start.max(other.start), self.end.min(other.end)))
    }
}

/// A named logical component owning address ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    #[serde(default)]
    pub ranges: Vec<ModuleRange>,
}

impl Module {
    pub fn new(id: ModuleId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ranges: Vec::new() }
    }

    /// The module's range inside `section_id`, if any.
    pub fn range_in(&self, section_id: SectionId) -> Option<&ModuleRange> {
        self.ranges.iter().find(|r| r.section_id == section_id)
    }

    pub(crate) fn range_in_mut(&mut self, section_id: SectionId) -> Option<&mut ModuleRange> {
        self.ranges.iter_mut().find(|r| r.section_id == section_id)
    }

    /// Case-insensitive name comparison, used for uniqueness checks.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// The aggregate root: executable bounds plus every section and module.
///
/// Maps are ordered by id so iteration (and therefore every report) is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub exe_range: Option<ExeRange>,
    pub sections: BTreeMap<SectionId, Section>,
    pub modules: BTreeMap<ModuleId, Module>,
    pub next_section_id: SectionId,
    pub next_module_id: ModuleId,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            exe_range: None,
            sections: BTreeMap::new(),
            modules: BTreeMap::new(),
            next_section_id: FIRST_ID,
            next_module_id: FIRST_ID,
        }
    }
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections ordered by start address.
    pub fn sections_by_start(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.values().collect();
        sections.sort_by_key(|s| (s.start, s.id));
        sections
    }

    /// Every `(module, range)` pair claiming space in `section_id`, in module id order.
    pub fn ranges_in_section(
        &self,
        section_id: SectionId,
    ) -> impl Iterator<Item = (&Module, &ModuleRange)> + '_ {
        self.modules.values().flat_map(move |m| {
            m.ranges.iter().filter(move |r| r.section_id == section_id).map(move |r| (m, r))
        })
    }

    /// Whether any module still holds a range inside `section_id`.
    pub fn section_is_referenced(&self, section_id: SectionId) -> bool {
        self.ranges_in_section(section_id).next().is_some()
    }

    /// Name of a section, or a placeholder when the id is unknown.
    pub fn section_name(&self, section_id: SectionId) -> String {
        self.sections
            .get(&section_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("<section #{section_id}>"))
    }
}
