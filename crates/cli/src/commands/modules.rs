use anyhow::Result;
use exemap_core::analysis::ModuleRangeView;
use serde::Serialize;

use crate::commands::{hex_for, mutate_workspace, open_workspace, resolve_module, resolve_module_id};

/// Add a module. Names are unique ignoring case.
pub fn add_module_command(root: &str, name: &str) -> Result<()> {
    let (ctx, id) = mutate_workspace(root, "add-module", |store| Ok(store.add_module(name)?))?;
    let module = ctx.store.module(id)?;
    println!("Added module '{}' (id {}).", module.name, module.id);
    Ok(())
}

/// Rename a module.
pub fn rename_module_command(root: &str, module: &str, new_name: &str) -> Result<()> {
    let (ctx, id) = mutate_workspace(root, "rename-module", |store| {
        let id = resolve_module_id(store, module)?;
        store.update_module(id, new_name)?;
        Ok(id)
    })?;
    println!("Renamed module #{} to '{}'.", id, ctx.store.module(id)?.name);
    Ok(())
}

/// Delete a module with all of its ranges.
pub fn delete_module_command(root: &str, module: &str) -> Result<()> {
    let (_ctx, (name, ranges)) = mutate_workspace(root, "delete-module", |store| {
        let current = resolve_module(store, module)?.clone();
        store.delete_module(current.id)?;
        Ok((current.name, current.ranges.len()))
    })?;
    println!("Deleted module '{}' ({} ranges).", name, ranges);
    Ok(())
}

#[derive(Serialize)]
struct ModuleListing {
    id: u32,
    name: String,
    ranges: Vec<ModuleRangeView>,
}

/// List modules with their ranges (sorted by start).
pub fn list_modules_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_workspace(root)?;
    let store = &ctx.store;

    let mut listings = Vec::new();
    for module in store.project().modules.values() {
        listings.push(ModuleListing {
            id: module.id,
            name: module.name.clone(),
            ranges: store.module_layout(module.id)?,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    println!("Modules:");
    if listings.is_empty() {
        println!("(none)");
        return Ok(());
    }
    let hex = hex_for(&ctx);
    for listing in listings {
        println!("- #{} {} ({} ranges)", listing.id, listing.name, listing.ranges.len());
        for view in listing.ranges {
            println!(
                "    {:<16} {} - {} (size {}){}",
                view.section_name,
                hex(view.range.start),
                hex(view.range.end),
                hex(view.range.size()),
                if view.range.locked { " [locked]" } else { "" }
            );
        }
    }
    Ok(())
}
