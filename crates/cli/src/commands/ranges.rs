use anyhow::Result;

use crate::commands::{hex_for, mutate_workspace, resolve_module, resolve_section};
use crate::parse_address;

/// Give a module a range inside a section.
pub fn add_range_command(
    root: &str,
    module: &str,
    section: &str,
    start: &str,
    end: &str,
    locked: bool,
) -> Result<()> {
    let start = parse_address(start)?;
    let end = parse_address(end)?;
    let (ctx, (module_name, section_name)) = mutate_workspace(root, "add-range", |store| {
        let module = resolve_module(store, module)?.clone();
        let section = resolve_section(store, section)?.clone();
        store.set_module_range(module.id, section.id, start, end, locked)?;
        Ok((module.name, section.name))
    })?;
    let hex = hex_for(&ctx);
    println!(
        "Added range {} - {} for module '{}' in section '{}'.",
        hex(start),
        hex(end),
        module_name,
        section_name
    );
    Ok(())
}

/// Change a range's bounds, optionally moving it to another section.
/// Omitted bounds keep their current value.
pub fn update_range_command(
    root: &str,
    module: &str,
    section: &str,
    to_section: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let start = start.map(parse_address).transpose()?;
    let end = end.map(parse_address).transpose()?;
    let (ctx, (module_name, section_name, new_start, new_end)) =
        mutate_workspace(root, "update-range", |store| {
            let module = resolve_module(store, module)?.clone();
            let from = resolve_section(store, section)?.id;
            let target = match to_section {
                Some(target) => resolve_section(store, target)?.clone(),
                None => store.section(from)?.clone(),
            };
            let current = store.range(module.id, from)?.clone();
            let new_start = start.unwrap_or(current.start);
            let new_end = end.unwrap_or(current.end);
            store.update_module_range(module.id, from, target.id, new_start, new_end)?;
            Ok((module.name, target.name, new_start, new_end))
        })?;
    let hex = hex_for(&ctx);
    println!(
        "Updated range of module '{}': section '{}', {} - {}.",
        module_name,
        section_name,
        hex(new_start),
        hex(new_end)
    );
    Ok(())
}

/// Hand a range over from one module to another.
pub fn move_range_command(root: &str, from: &str, to: &str, section: &str) -> Result<()> {
    let (_ctx, (from_name, to_name, section_name)) =
        mutate_workspace(root, "move-range", |store| {
            let from = resolve_module(store, from)?.clone();
            let to = resolve_module(store, to)?.clone();
            let section = resolve_section(store, section)?.clone();
            store.move_module_range(from.id, to.id, section.id)?;
            Ok((from.name, to.name, section.name))
        })?;
    println!("Moved range in section '{}' from '{}' to '{}'.", section_name, from_name, to_name);
    Ok(())
}

/// Lock or unlock a module's range in a section.
pub fn set_range_lock_command(root: &str, module: &str, section: &str, locked: bool) -> Result<()> {
    let (_ctx, (module_name, section_name)) =
        mutate_workspace(root, "set-range-lock", |store| {
            let module = resolve_module(store, module)?.clone();
            let section = resolve_section(store, section)?.clone();
            store.set_module_range_lock(module.id, section.id, locked)?;
            Ok((module.name, section.name))
        })?;
    let state = if locked { "Locked" } else { "Unlocked" };
    println!("{} range of module '{}' in section '{}'.", state, module_name, section_name);
    Ok(())
}

/// Remove a module's range from a section.
pub fn remove_range_command(root: &str, module: &str, section: &str) -> Result<()> {
    let (_ctx, (module_name, section_name)) =
        mutate_workspace(root, "remove-range", |store| {
            let module = resolve_module(store, module)?.clone();
            let section = resolve_section(store, section)?.clone();
            store.remove_module_range(module.id, section.id)?;
            Ok((module.name, section.name))
        })?;
    println!("Removed range of module '{}' from section '{}'.", module_name, section_name);
    Ok(())
}
