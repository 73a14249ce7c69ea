use exemap_core::model::FIRST_ID;
use exemap_core::store::{EntityRef, ErrorKind, ProjectStore};

fn store_with_text_and_data() -> ProjectStore {
    let mut store = ProjectStore::new();
    store.set_executable_range(0x1000, 0x8000).unwrap();
    store.add_section(".text", 0x1000, 0x4000, false).unwrap();
    store.add_section(".data", 0x4000, 0x6000, false).unwrap();
    store
}

#[test]
fn add_section_mints_sequential_ids() {
    let mut store = ProjectStore::new();
    let text = store.add_section(".text", 0x1000, 0x2000, false).unwrap();
    let data = store.add_section(".data", 0x2000, 0x3000, true).unwrap();

    assert_eq!(text, FIRST_ID);
    assert_eq!(data, FIRST_ID + 1);
    assert!(store.section(data).unwrap().locked);
    assert_eq!(store.project().next_section_id, FIRST_ID + 2);
}

#[test]
fn add_section_rejects_overlap_but_allows_touching() {
    let mut store = ProjectStore::new();
    store.add_section(".text", 0x1000, 0x2000, false).unwrap();

    let err = store.add_section(".data", 0x1800, 0x2800, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("overlaps existing section '.text'"), "{err}");

    // A rejected add does not burn an id.
    let data = store.add_section(".data", 0x2000, 0x3000, false).unwrap();
    assert_eq!(data, FIRST_ID + 1);
}

#[test]
fn add_section_rejects_bad_bounds_and_empty_names() {
    let mut store = ProjectStore::new();
    assert!(store.add_section(".text", 0x2000, 0x2000, false).is_err());
    assert!(store.add_section(".text", 0x3000, 0x2000, false).is_err());

    let err = store.add_section("   ", 0x1000, 0x2000, false).unwrap_err();
    assert!(err.to_string().contains("name cannot be empty"));
    assert!(store.project().sections.is_empty());
}

#[test]
fn sections_must_fit_the_executable_range() {
    let mut store = ProjectStore::new();
    store.set_executable_range(0x1000, 0x8000).unwrap();

    let err = store.add_section(".reloc", 0x7800, 0x9000, false).unwrap_err();
    assert!(err.to_string().contains("must lie inside the executable range"), "{err}");
    store.add_section(".reloc", 0x7800, 0x8000, false).unwrap();
}

#[test]
fn executable_range_must_cover_existing_sections() {
    let mut store = ProjectStore::new();
    store.add_section(".text", 0x1000, 0x2000, false).unwrap();

    let err = store.set_executable_range(0x1800, 0x9000).unwrap_err();
    assert_eq!(err.to_string(), "Executable range does not cover existing section '.text'.");
    assert!(store.project().exe_range.is_none());

    assert!(store.set_executable_range(0x5000, 0x5000).is_err());
    store.set_executable_range(0x1000, 0x2000).unwrap();
    store.clear_executable_range();
    assert!(store.project().exe_range.is_none());
}

#[test]
fn update_section_rejects_overlap_without_touching_anything() {
    let mut store = store_with_text_and_data();
    let before = store.project().clone();

    let err = store.update_section(2, ".data", 0x3000, 0x6000).unwrap_err();
    assert!(err.to_string().contains("overlaps existing section '.text'"), "{err}");
    assert_eq!(store.project(), &before);

    // Moving within its own footprint is fine.
    store.update_section(2, ".rdata", 0x4800, 0x6000).unwrap();
    let section = store.section(2).unwrap();
    assert_eq!((section.name.as_str(), section.start, section.end), (".rdata", 0x4800, 0x6000));
}

#[test]
fn update_section_keeps_existing_ranges_inside() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    store.set_module_range(core, 1, 0x2000, 0x3800, false).unwrap();

    let err = store.update_section(1, ".text", 0x1000, 0x3000).unwrap_err();
    assert!(err.to_string().contains("would no longer contain"), "{err}");
    store.update_section(1, ".text", 0x1800, 0x3800).unwrap();
}

#[test]
fn locked_section_rejects_edit_and_delete_until_unlocked() {
    let mut store = store_with_text_and_data();
    store.set_section_lock(1, true).unwrap();

    let err = store.update_section(1, ".code", 0x1000, 0x4000).unwrap_err();
    assert!(err.to_string().contains("is locked and cannot be edited"));
    let err = store.delete_section(1).unwrap_err();
    assert!(err.to_string().contains("is locked and cannot be deleted"));

    store.set_section_lock(1, false).unwrap();
    store.update_section(1, ".code", 0x1000, 0x4000).unwrap();
    store.delete_section(1).unwrap();
    assert!(store.section(1).is_err());
}

#[test]
fn delete_section_is_rejected_while_ranges_reference_it() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    let render = store.add_module("Render").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, false).unwrap();
    store.set_module_range(render, 1, 0x2000, 0x3000, false).unwrap();

    let err = store.delete_section(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("still has module ranges (Core, Render)"), "{err}");
    assert!(store.section(1).is_ok());

    store.remove_module_range(core, 1).unwrap();
    store.remove_module_range(render, 1).unwrap();
    store.delete_section(1).unwrap();

    // Analyses stay consistent after the delete.
    assert!(store.compute_module_holes().iter().all(|h| h.section_id == 2));
    assert!(store.find_address(0x1800).section.is_none());
}

#[test]
fn section_ids_are_not_reused_after_delete() {
    let mut store = ProjectStore::new();
    let first = store.add_section(".text", 0x1000, 0x2000, false).unwrap();
    store.delete_section(first).unwrap();
    let second = store.add_section(".text", 0x1000, 0x2000, false).unwrap();
    assert_ne!(first, second);
}

#[test]
fn module_names_are_unique_ignoring_case() {
    let mut store = ProjectStore::new();
    let core = store.add_module("Core").unwrap();

    let err = store.add_module("core").unwrap_err();
    assert_eq!(err.to_string(), "Module 'core' already exists.");

    let render = store.add_module("  Render  ").unwrap();
    assert_eq!(store.module(render).unwrap().name, "Render");
    assert_eq!(store.find_module_by_name("RENDER").map(|m| m.id), Some(render));

    // Renaming to a different case of its own name is allowed.
    store.update_module(core, "CORE").unwrap();
    assert_eq!(store.module(core).unwrap().name, "CORE");
    assert!(store.update_module(core, "render").is_err());
    assert!(store.update_module(core, "").is_err());
}

#[test]
fn delete_module_drops_its_ranges() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, false).unwrap();

    store.delete_module(core).unwrap();
    assert!(!store.project().section_is_referenced(1));
    store.delete_section(1).unwrap();
}

#[test]
fn missing_entities_are_reported_as_not_found() {
    let mut store = store_with_text_and_data();

    let err = store.delete_module(42).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "module #42 not found");

    let err = store.update_section(9, ".x", 0x7000, 0x7100).unwrap_err();
    assert!(matches!(err, exemap_core::store::StoreError::NotFound(EntityRef::Section(9))));

    let core = store.add_module("Core").unwrap();
    let err = store.set_module_range(core, 9, 0x1000, 0x1100, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = store.remove_module_range(core, 1).unwrap_err();
    assert_eq!(err.to_string(), "range of module #1 in section #1 not found");
}

#[test]
fn module_range_must_fit_its_section() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();

    let err = store.set_module_range(core, 1, 0x3800, 0x4800, false).unwrap_err();
    assert!(err.to_string().contains("lies outside section '.text'"), "{err}");
    assert!(store.set_module_range(core, 1, 0x2000, 0x2000, false).is_err());
    assert!(store.module(core).unwrap().ranges.is_empty());
}

#[test]
fn one_range_per_module_per_section() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, false).unwrap();

    let err = store.set_module_range(core, 1, 0x3000, 0x3800, false).unwrap_err();
    assert!(err.to_string().contains("already has a range in section '.text'"));

    store.set_module_range(core, 2, 0x4000, 0x4400, false).unwrap();
    assert_eq!(store.module(core).unwrap().ranges.len(), 2);
}

#[test]
fn update_module_range_can_move_between_sections() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, false).unwrap();

    store.update_module_range(core, 1, 1, 0x1200, 0x2200).unwrap();
    assert_eq!(store.range(core, 1).unwrap().start, 0x1200);

    // Bounds are checked against the target section.
    assert!(store.update_module_range(core, 1, 2, 0x1200, 0x2200).is_err());
    store.update_module_range(core, 1, 2, 0x4000, 0x5000).unwrap();
    assert!(store.range(core, 1).is_err());
    assert_eq!(store.range(core, 2).unwrap().end, 0x5000);
}

#[test]
fn update_module_range_rejects_second_range_in_target_section() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, false).unwrap();
    store.set_module_range(core, 2, 0x4000, 0x5000, false).unwrap();
    let before = store.project().clone();

    let err = store.update_module_range(core, 1, 2, 0x5000, 0x5800).unwrap_err();
    assert!(err.to_string().contains("already has a range in section '.data'"));
    assert_eq!(store.project(), &before);
}

#[test]
fn locked_range_rejects_edit_move_and_remove() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    let render = store.add_module("Render").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, true).unwrap();
    let before = store.project().clone();

    let err = store.update_module_range(core, 1, 1, 0x1000, 0x2800).unwrap_err();
    assert!(err.to_string().contains("is locked and cannot be edited"), "{err}");
    let err = store.move_module_range(core, render, 1).unwrap_err();
    assert!(err.to_string().contains("is locked and cannot be moved"), "{err}");
    let err = store.remove_module_range(core, 1).unwrap_err();
    assert!(err.to_string().contains("is locked and cannot be removed"), "{err}");
    assert_eq!(store.project(), &before);

    store.set_module_range_lock(core, 1, false).unwrap();
    store.remove_module_range(core, 1).unwrap();
    assert!(store.module(core).unwrap().ranges.is_empty());
}

#[test]
fn move_module_range_hands_the_range_over() {
    let mut store = store_with_text_and_data();
    let core = store.add_module("Core").unwrap();
    let render = store.add_module("Render").unwrap();
    store.set_module_range(core, 1, 0x1000, 0x2000, false).unwrap();

    store.move_module_range(core, render, 1).unwrap();
    assert!(store.range(core, 1).is_err());
    let moved = store.range(render, 1).unwrap();
    assert_eq!((moved.start, moved.end), (0x1000, 0x2000));

    // Target already owning a range in the section blocks the move.
    store.set_module_range(core, 1, 0x2000, 0x3000, false).unwrap();
    let err = store.move_module_range(core, render, 1).unwrap_err();
    assert!(err.to_string().contains("Module 'Render' already has a range"));

    // Moving to itself is a no-op.
    store.move_module_range(core, core, 1).unwrap();
    assert_eq!(store.range(core, 1).unwrap().start, 0x2000);
}

#[test]
fn from_project_rejects_inconsistent_projects() {
    let store = store_with_text_and_data();
    let mut project = store.into_project();
    project.sections.get_mut(&2).unwrap().start = 0x3000;

    let err = ProjectStore::from_project(project).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(err.to_string().contains("overlap"));
}
