//! exemap-core
//!
//! Core library for mapping the layout of an executable: a flat address space
//! split into non-overlapping sections, which named modules claim ranges of.
//!
//! This crate defines the entity model, the validated project store, the
//! analysis engine (holes, overlaps, address lookup, coverage), the JSON
//! document codec, and workspace layout/config helpers.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, GUI, etc.).

pub mod model;
pub mod analysis;
pub mod store;
pub mod persist;
pub mod workspace;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
