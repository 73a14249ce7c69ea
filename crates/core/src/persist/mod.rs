//! JSON encoding of a `Project`.
//!
//! The canonical document always lists `sections` and `modules` as arrays.
//! Older documents keyed both by id (`{"1": {...}, "2": {...}}`); those are
//! still accepted on input and converted transparently, but never written.
//!
//! Decoding is all-or-nothing: the document is parsed into a complete
//! `Project`, every invariant is checked, and only then is it handed back.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    intervals_overlap, Address, ExeRange, Module, ModuleRange, Project, Section, FIRST_ID,
};
use crate::store::{StoreError, StoreResult};

/// Document format this crate writes.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// On-disk shape of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// RFC 3339 time of the last save. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub exe_start: Option<Address>,
    #[serde(default)]
    pub exe_end: Option<Address>,
    #[serde(default)]
    pub sections: Collection<Section>,
    #[serde(default)]
    pub modules: Collection<DocumentModule>,
    #[serde(default = "default_next_id")]
    pub next_section_id: u32,
    #[serde(default = "default_next_id")]
    pub next_module_id: u32,
}

/// Module record as stored in a document. Ranges default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentModule {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub ranges: Vec<ModuleRange>,
}

/// A list of records, or (legacy input only) a map from id to record.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Collection<T> {
    List(Vec<T>),
    Keyed(BTreeMap<String, T>),
}

// Dispatch on the JSON shape first so a bad field inside a record reports
// its own error instead of a generic untagged mismatch.
impl<'de, T: DeserializeOwned> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(_) => {
                serde_json::from_value(value).map(Collection::List).map_err(de::Error::custom)
            }
            Value::Object(_) => {
                serde_json::from_value(value).map(Collection::Keyed).map_err(de::Error::custom)
            }
            other => Err(de::Error::custom(format!(
                "expected a list or an id-keyed map of records, found {other}"
            ))),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection::List(Vec::new())
    }
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::List(items) => items,
            Collection::Keyed(map) => map.into_values().collect(),
        }
    }
}

fn default_format_version() -> u32 {
    CURRENT_FORMAT_VERSION
}

fn default_next_id() -> u32 {
    FIRST_ID
}

impl ProjectDocument {
    /// Snapshot a project in canonical (list) form.
    pub fn from_project(project: &Project, saved_at: Option<String>) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            saved_at,
            exe_start: project.exe_range.map(|r| r.start),
            exe_end: project.exe_range.map(|r| r.end),
            sections: Collection::List(project.sections.values().cloned().collect()),
            modules: Collection::List(
                project
                    .modules
                    .values()
                    .map(|m| DocumentModule {
                        id: m.id,
                        name: m.name.clone(),
                        ranges: m.ranges.clone(),
                    })
                    .collect(),
            ),
            next_section_id: project.next_section_id,
            next_module_id: project.next_module_id,
        }
    }

    /// Build and validate the project this document describes.
    pub fn into_project(self) -> StoreResult<Project> {
        if self.format_version > CURRENT_FORMAT_VERSION {
            return Err(StoreError::UnsupportedFormatVersion {
                found: self.format_version,
                max_supported: CURRENT_FORMAT_VERSION,
            });
        }

        let exe_range = match (self.exe_start, self.exe_end) {
            (Some(start), Some(end)) => Some(ExeRange::new(start, end)),
            (None, None) => None,
            _ => {
                return Err(invalid("exe_start and exe_end must both be set or both be null"));
            }
        };

        let mut project = Project { exe_range, ..Project::default() };

        for section in self.sections.into_vec() {
            let id = section.id;
            if project.sections.insert(id, section).is_some() {
                return Err(invalid(format!("duplicate section id {id}")));
            }
        }
        for record in self.modules.into_vec() {
            let id = record.id;
            let module = Module { id, name: record.name, ranges: record.ranges };
            if project.modules.insert(id, module).is_some() {
                return Err(invalid(format!("duplicate module id {id}")));
            }
        }

        // Counters must stay ahead of every id in use.
        let max_section = project.sections.keys().next_back().copied().unwrap_or(0);
        let max_module = project.modules.keys().next_back().copied().unwrap_or(0);
        project.next_section_id =
            self.next_section_id.max(max_section.saturating_add(1)).max(FIRST_ID);
        project.next_module_id = self.next_module_id.max(max_module.saturating_add(1)).max(FIRST_ID);

        validate_project(&project)?;
        Ok(project)
    }
}

fn invalid(reason: impl Into<String>) -> StoreError {
    StoreError::InvalidDocument(reason.into())
}

/// Check every structural invariant of a project.
pub fn validate_project(project: &Project) -> StoreResult<()> {
    if let Some(exe) = project.exe_range {
        if exe.start >= exe.end {
            return Err(invalid(format!(
                "executable range 0x{:X}-0x{:X} is empty or inverted",
                exe.start, exe.end
            )));
        }
    }

    for (key, section) in &project.sections {
        if *key != section.id {
            return Err(invalid(format!("section '{}' stored under id {key}", section.name)));
        }
        if section.name.trim().is_empty() {
            return Err(invalid(format!("section #{} has an empty name", section.id)));
        }
        if section.start >= section.end {
            return Err(invalid(format!("section '{}' has start >= end", section.name)));
        }
        if let Some(exe) = project.exe_range {
            if !exe.covers(section.start, section.end) {
                return Err(invalid(format!(
                    "section '{}' lies outside the executable range",
                    section.name
                )));
            }
        }
    }

    let sorted = project.sections_by_start();
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if intervals_overlap(a.start, a.end, b.start, b.end) {
            return Err(invalid(format!("sections '{}' and '{}' overlap", a.name, b.name)));
        }
    }

    let mut names = HashSet::new();
    for (key, module) in &project.modules {
        if *key != module.id {
            return Err(invalid(format!("module '{}' stored under id {key}", module.name)));
        }
        if module.name.trim().is_empty() {
            return Err(invalid(format!("module #{} has an empty name", module.id)));
        }
        if !names.insert(module.name.to_lowercase()) {
            return Err(invalid(format!("module name '{}' is used more than once", module.name)));
        }

        let mut covered = HashSet::new();
        for range in &module.ranges {
            let Some(section) = project.sections.get(&range.section_id) else {
                return Err(invalid(format!(
                    "module '{}' references missing section #{}",
                    module.name, range.section_id
                )));
            };
            if !section.encloses(range.start, range.end) {
                return Err(invalid(format!(
                    "module '{}' range 0x{:X}-0x{:X} lies outside section '{}'",
                    module.name, range.start, range.end, section.name
                )));
            }
            if !covered.insert(range.section_id) {
                return Err(invalid(format!(
                    "module '{}' has more than one range in section '{}'",
                    module.name, section.name
                )));
            }
        }
    }

    let max_section = project.sections.keys().next_back().copied().unwrap_or(0);
    let max_module = project.modules.keys().next_back().copied().unwrap_or(0);
    if project.next_section_id <= max_section || project.next_module_id <= max_module {
        return Err(invalid("id counters must be greater than every id in use"));
    }
    Ok(())
}

/// Encode `project` as pretty-printed canonical JSON.
pub fn to_json(project: &Project, saved_at: Option<String>) -> StoreResult<String> {
    let document = ProjectDocument::from_project(project, saved_at);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Decode and validate a project document (canonical or legacy shape).
pub fn from_json(text: &str) -> StoreResult<Project> {
    let document: ProjectDocument = serde_json::from_str(text)?;
    document.into_project()
}

/// Read and decode the document at `path`.
pub fn read_file(path: &Path) -> StoreResult<Project> {
    let text = fs::read_to_string(path)
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    from_json(&text)
}

/// Write `project` to `path`, replacing any existing file in one step.
///
/// The document goes to a sibling temp file first and is then renamed over
/// the target, so a failed write never leaves a truncated document behind.
pub fn write_file(project: &Project, path: &Path) -> StoreResult<()> {
    let stamp = chrono::Utc::now().to_rfc3339();
    let json = to_json(project, Some(stamp))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)
        .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}
