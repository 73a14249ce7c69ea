//! Project store: the single owner of a `Project` and its mutation API.
//!
//! Every mutation is validate-then-commit. All checks run against the current
//! state before any field is written, so a rejected call leaves the project
//! exactly as it was. The store enforces every invariant itself, including the
//! ones an editor would normally check (module name uniqueness, one range per
//! module per section, locked entities), so callers cannot corrupt it.

mod error;

use std::path::Path;

pub use error::{EntityRef, ErrorKind, StoreError, StoreResult};

use crate::analysis::{
    self, AddressLookup, CoverageSegment, LayoutEntry, ModuleHole, ModuleOverlap,
    ModuleRangeView, ProjectSummary, SectionHole,
};
use crate::model::{
    Address, ExeRange, Module, ModuleId, ModuleRange, Project, Section, SectionId,
};
use crate::persist;

/// In-memory owner of one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    project: Project,
}

impl ProjectStore {
    /// Create a store holding a fresh, empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing project after checking every invariant.
    pub fn from_project(project: Project) -> StoreResult<Self> {
        persist::validate_project(&project)?;
        Ok(Self { project })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn section(&self, id: SectionId) -> StoreResult<&Section> {
        self.project.sections.get(&id).ok_or(StoreError::NotFound(EntityRef::Section(id)))
    }

    pub fn module(&self, id: ModuleId) -> StoreResult<&Module> {
        self.project.modules.get(&id).ok_or(StoreError::NotFound(EntityRef::Module(id)))
    }

    /// First section (by ascending id) carrying exactly this name.
    pub fn find_section_by_name(&self, name: &str) -> Option<&Section> {
        self.project.sections.values().find(|s| s.name == name)
    }

    /// Module whose name matches case-insensitively.
    pub fn find_module_by_name(&self, name: &str) -> Option<&Module> {
        self.project.modules.values().find(|m| m.name_matches(name))
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Encode the project as the canonical JSON document.
    pub fn to_json(&self) -> StoreResult<String> {
        persist::to_json(&self.project, None)
    }

    /// Decode a project document into a new store. Never yields a partial project.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        Ok(Self { project: persist::from_json(text)? })
    }

    /// Replace the current project with the one stored at `path`.
    ///
    /// The previous in-memory project is kept untouched if loading fails.
    pub fn load(&mut self, path: &Path) -> StoreResult<()> {
        let project = persist::read_file(path)?;
        self.project = project;
        Ok(())
    }

    /// Write the project to `path`, stamped with the current time.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        persist::write_file(&self.project, path)
    }

    // ---------------------------------------------------------------------
    // Executable range
    // ---------------------------------------------------------------------

    /// Set the executable bounds. Existing sections must fit inside them.
    pub fn set_executable_range(&mut self, start: Address, end: Address) -> StoreResult<()> {
        if start >= end {
            return Err(StoreError::validation(format!(
                "Executable start 0x{start:X} must be below end 0x{end:X}."
            )));
        }
        let range = ExeRange::new(start, end);
        let uncovered =
            self.project.sections_by_start().into_iter().find(|s| !range.covers(s.start, s.end));
        if let Some(sec) = uncovered {
            return Err(StoreError::validation(format!(
                "Executable range does not cover existing section '{}'.",
                sec.name
            )));
        }
        self.project.exe_range = Some(range);
        Ok(())
    }

    pub fn clear_executable_range(&mut self) {
        self.project.exe_range = None;
    }

    // ---------------------------------------------------------------------
    // Sections
    // ---------------------------------------------------------------------

    /// Add a section and return its freshly minted id.
    pub fn add_section(
        &mut self,
        name: &str,
        start: Address,
        end: Address,
        locked: bool,
    ) -> StoreResult<SectionId> {
        let name = normalized_name(name, "Section")?;
        self.check_section_placement(&name, start, end, None)?;

        let id = self.project.next_section_id;
        let mut section = Section::new(id, name, start, end);
        section.locked = locked;
        self.project.sections.insert(id, section);
        self.project.next_section_id += 1;
        Ok(id)
    }

    /// Rename and/or move a section. The lock flag and id are unaffected.
    pub fn update_section(
        &mut self,
        id: SectionId,
        name: &str,
        start: Address,
        end: Address,
    ) -> StoreResult<()> {
        let current = self.section(id)?;
        if current.locked {
            return Err(StoreError::validation(format!(
                "Section '{}' is locked and cannot be edited.",
                current.name
            )));
        }
        let name = normalized_name(name, "Section")?;
        self.check_section_placement(&name, start, end, Some(id))?;

        // Module ranges already placed in this section must still fit.
        if let Some((module, range)) = self
            .project
            .ranges_in_section(id)
            .find(|(_, r)| !(start <= r.start && r.end <= end))
        {
            return Err(StoreError::validation(format!(
                "Section '{name}' would no longer contain range 0x{:X}-0x{:X} of module '{}'.",
                range.start, range.end, module.name
            )));
        }

        if let Some(section) = self.project.sections.get_mut(&id) {
            section.name = name;
            section.start = start;
            section.end = end;
        }
        Ok(())
    }

    /// Delete a section. Rejected while locked or while any module range
    /// still references it.
    pub fn delete_section(&mut self, id: SectionId) -> StoreResult<()> {
        let section = self.section(id)?;
        if section.locked {
            return Err(StoreError::validation(format!(
                "Section '{}' is locked and cannot be deleted.",
                section.name
            )));
        }
        let owners: Vec<String> =
            self.project.ranges_in_section(id).map(|(m, _)| m.name.clone()).collect();
        if !owners.is_empty() {
            return Err(StoreError::validation(format!(
                "Section '{}' still has module ranges ({}); remove them first.",
                section.name,
                owners.join(", ")
            )));
        }
        self.project.sections.remove(&id);
        Ok(())
    }

    pub fn set_section_lock(&mut self, id: SectionId, locked: bool) -> StoreResult<()> {
        let section =
            self.project.sections.get_mut(&id).ok_or(StoreError::NotFound(EntityRef::Section(id)))?;
        section.locked = locked;
        Ok(())
    }

    /// Shared placement rules for add/update: ordering, executable bounds and
    /// overlap with every other section.
    fn check_section_placement(
        &self,
        name: &str,
        start: Address,
        end: Address,
        editing: Option<SectionId>,
    ) -> StoreResult<()> {
        if start >= end {
            return Err(StoreError::validation(format!(
                "Section '{name}' start 0x{start:X} must be below end 0x{end:X}."
            )));
        }
        if let Some(exe) = self.project.exe_range {
            if !exe.covers(start, end) {
                return Err(StoreError::validation(format!(
                    "Section '{name}' must lie inside the executable range 0x{:X}-0x{:X}.",
                    exe.start, exe.end
                )));
            }
        }
        let conflict = self
            .project
            .sections
            .values()
            .filter(|s| Some(s.id) != editing)
            .find(|s| s.overlaps(start, end));
        if let Some(other) = conflict {
            return Err(StoreError::validation(format!(
                "Section '{name}' overlaps existing section '{}'.",
                other.name
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Modules
    // ---------------------------------------------------------------------

    /// Add an empty module and return its id. Names are unique ignoring case.
    pub fn add_module(&mut self, name: &str) -> StoreResult<ModuleId> {
        let name = normalized_name(name, "Module")?;
        self.check_module_name_free(&name, None)?;

        let id = self.project.next_module_id;
        self.project.modules.insert(id, Module::new(id, name));
        self.project.next_module_id += 1;
        Ok(id)
    }

    pub fn update_module(&mut self, id: ModuleId, name: &str) -> StoreResult<()> {
        self.module(id)?;
        let name = normalized_name(name, "Module")?;
        self.check_module_name_free(&name, Some(id))?;
        if let Some(module) = self.project.modules.get_mut(&id) {
            module.name = name;
        }
        Ok(())
    }

    /// Remove a module together with all of its ranges.
    pub fn delete_module(&mut self, id: ModuleId) -> StoreResult<()> {
        self.project.modules.remove(&id).ok_or(StoreError::NotFound(EntityRef::Module(id)))?;
        Ok(())
    }

    fn check_module_name_free(&self, name: &str, renaming: Option<ModuleId>) -> StoreResult<()> {
        match self.find_module_by_name(name) {
            Some(existing) if Some(existing.id) != renaming => {
                Err(StoreError::validation(format!("Module '{name}' already exists.")))
            }
            _ => Ok(()),
        }
    }

    // ---------------------------------------------------------------------
    // Module ranges
    // ---------------------------------------------------------------------

    /// Give `module_id` a range inside `section_id`.
    pub fn set_module_range(
        &mut self,
        module_id: ModuleId,
        section_id: SectionId,
        start: Address,
        end: Address,
        locked: bool,
    ) -> StoreResult<()> {
        let module = self.module(module_id)?;
        let section = self.section(section_id)?;
        check_range_bounds(section, start, end)?;
        if module.range_in(section_id).is_some() {
            return Err(StoreError::validation(format!(
                "Module '{}' already has a range in section '{}'.",
                module.name, section.name
            )));
        }

        let mut range = ModuleRange::new(section_id, start, end);
        range.locked = locked;
        if let Some(module) = self.project.modules.get_mut(&module_id) {
            module.ranges.push(range);
        }
        Ok(())
    }

    /// Change the bounds of an existing range, optionally moving it into
    /// `new_section_id`.
    pub fn update_module_range(
        &mut self,
        module_id: ModuleId,
        section_id: SectionId,
        new_section_id: SectionId,
        start: Address,
        end: Address,
    ) -> StoreResult<()> {
        let (module, range) = self.unlocked_range(module_id, section_id, "edited")?;
        let target = self.section(new_section_id)?;
        check_range_bounds(target, start, end)?;
        if new_section_id != range.section_id && module.range_in(new_section_id).is_some() {
            return Err(StoreError::validation(format!(
                "Module '{}' already has a range in section '{}'.",
                module.name, target.name
            )));
        }

        if let Some(range) =
            self.project.modules.get_mut(&module_id).and_then(|m| m.range_in_mut(section_id))
        {
            range.section_id = new_section_id;
            range.start = start;
            range.end = end;
        }
        Ok(())
    }

    /// Hand the range `from_module` owns in `section_id` over to `to_module`.
    pub fn move_module_range(
        &mut self,
        from_module: ModuleId,
        to_module: ModuleId,
        section_id: SectionId,
    ) -> StoreResult<()> {
        if from_module == to_module {
            self.range(from_module, section_id)?;
            return Ok(());
        }
        self.unlocked_range(from_module, section_id, "moved")?;
        let target = self.module(to_module)?;
        if target.range_in(section_id).is_some() {
            return Err(StoreError::validation(format!(
                "Module '{}' already has a range in section '{}'.",
                target.name,
                self.project.section_name(section_id)
            )));
        }

        let Some(source) = self.project.modules.get_mut(&from_module) else {
            return Err(StoreError::NotFound(EntityRef::Module(from_module)));
        };
        let Some(pos) = source.ranges.iter().position(|r| r.section_id == section_id) else {
            let missing = EntityRef::Range { module: from_module, section: section_id };
            return Err(StoreError::NotFound(missing));
        };
        let range = source.ranges.remove(pos);
        if let Some(target) = self.project.modules.get_mut(&to_module) {
            target.ranges.push(range);
        }
        Ok(())
    }

    pub fn set_module_range_lock(
        &mut self,
        module_id: ModuleId,
        section_id: SectionId,
        locked: bool,
    ) -> StoreResult<()> {
        self.range(module_id, section_id)?;
        if let Some(range) =
            self.project.modules.get_mut(&module_id).and_then(|m| m.range_in_mut(section_id))
        {
            range.locked = locked;
        }
        Ok(())
    }

    /// Remove every range `module_id` holds inside `section_id`.
    pub fn remove_module_range(
        &mut self,
        module_id: ModuleId,
        section_id: SectionId,
    ) -> StoreResult<()> {
        self.unlocked_range(module_id, section_id, "removed")?;
        if let Some(module) = self.project.modules.get_mut(&module_id) {
            module.ranges.retain(|r| r.section_id != section_id);
        }
        Ok(())
    }

    /// Look up the range a module owns in a section.
    pub fn range(&self, module_id: ModuleId, section_id: SectionId) -> StoreResult<&ModuleRange> {
        self.module(module_id)?
            .range_in(section_id)
            .ok_or(StoreError::NotFound(EntityRef::Range { module: module_id, section: section_id }))
    }

    fn unlocked_range(
        &self,
        module_id: ModuleId,
        section_id: SectionId,
        action: &str,
    ) -> StoreResult<(&Module, &ModuleRange)> {
        let module = self.module(module_id)?;
        let range = self.range(module_id, section_id)?;
        if range.locked {
            return Err(StoreError::validation(format!(
                "Range of module '{}' in section '{}' is locked and cannot be {action}.",
                module.name,
                self.project.section_name(section_id)
            )));
        }
        Ok((module, range))
    }

    // ---------------------------------------------------------------------
    // Analysis
    // ---------------------------------------------------------------------

    pub fn compute_section_holes(&self) -> Vec<SectionHole> {
        analysis::section_holes(&self.project)
    }

    pub fn compute_module_holes(&self) -> Vec<ModuleHole> {
        analysis::module_holes(&self.project)
    }

    pub fn compute_module_overlaps(&self) -> Vec<ModuleOverlap> {
        analysis::module_overlaps(&self.project)
    }

    pub fn find_address(&self, address: Address) -> AddressLookup {
        analysis::find_address(&self.project, address)
    }

    pub fn coverage_map(&self) -> Vec<CoverageSegment> {
        analysis::coverage_map(&self.project)
    }

    pub fn section_layout(&self, section_id: SectionId) -> StoreResult<Vec<LayoutEntry>> {
        self.section(section_id)?;
        Ok(analysis::section_layout(&self.project, section_id))
    }

    pub fn module_layout(&self, module_id: ModuleId) -> StoreResult<Vec<ModuleRangeView>> {
        self.module(module_id)?;
        Ok(analysis::module_layout(&self.project, module_id))
    }

    pub fn modules_without_range(&self, section_id: SectionId) -> StoreResult<Vec<&Module>> {
        self.section(section_id)?;
        Ok(analysis::modules_without_range(&self.project, section_id))
    }

    pub fn summary(&self) -> ProjectSummary {
        analysis::summary(&self.project)
    }
}

/// Trim a display name and reject empty ones.
fn normalized_name(name: &str, what: &str) -> StoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(format!("{what} name cannot be empty.")));
    }
    Ok(trimmed.to_string())
}

fn check_range_bounds(section: &Section, start: Address, end: Address) -> StoreResult<()> {
    if start >= end {
        return Err(StoreError::validation(format!(
            "Range start 0x{start:X} must be below end 0x{end:X}."
        )));
    }
    if !section.encloses(start, end) {
        return Err(StoreError::validation(format!(
            "Range 0x{start:X}-0x{end:X} lies outside section '{}' (0x{:X}-0x{:X}).",
            section.name, section.start, section.end
        )));
    }
    Ok(())
}
