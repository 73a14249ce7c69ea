use anyhow::Result;
use exemap_core::analysis::LayoutEntry;
use exemap_core::model::Section;
use serde::Serialize;

use crate::commands::{
    hex_for, mutate_workspace, open_workspace, resolve_section, resolve_section_id,
};
use crate::parse_address;

/// Add a section.
pub fn add_section_command(
    root: &str,
    name: &str,
    start: &str,
    end: &str,
    locked: bool,
) -> Result<()> {
    let start = parse_address(start)?;
    let end = parse_address(end)?;
    let (ctx, id) = mutate_workspace(root, "add-section", |store| {
        Ok(store.add_section(name, start, end, locked)?)
    })?;
    let section = ctx.store.section(id)?;
    let hex = hex_for(&ctx);
    println!("Added section:");
    println!("  Id: {}", section.id);
    println!("  Name: {}", section.name);
    println!("  Range: {} - {} (size {})", hex(section.start), hex(section.end), hex(section.size()));
    Ok(())
}

/// Rename and/or move a section. Omitted values keep their current setting.
pub fn update_section_command(
    root: &str,
    section: &str,
    name: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let start = start.map(parse_address).transpose()?;
    let end = end.map(parse_address).transpose()?;
    let (ctx, id) = mutate_workspace(root, "update-section", |store| {
        let current = resolve_section(store, section)?.clone();
        store.update_section(
            current.id,
            name.unwrap_or(&current.name),
            start.unwrap_or(current.start),
            end.unwrap_or(current.end),
        )?;
        Ok(current.id)
    })?;
    let updated = ctx.store.section(id)?;
    let hex = hex_for(&ctx);
    println!("Updated section '{}': {} - {}", updated.name, hex(updated.start), hex(updated.end));
    Ok(())
}

/// Delete a section (rejected while locked or while modules still claim ranges in it).
pub fn delete_section_command(root: &str, section: &str) -> Result<()> {
    let (_ctx, name) = mutate_workspace(root, "delete-section", |store| {
        let current = resolve_section(store, section)?.clone();
        store.delete_section(current.id)?;
        Ok(current.name)
    })?;
    println!("Deleted section '{}'.", name);
    Ok(())
}

/// Lock or unlock a section.
pub fn set_section_lock_command(root: &str, section: &str, locked: bool) -> Result<()> {
    let (ctx, id) = mutate_workspace(root, "set-section-lock", |store| {
        let id = resolve_section_id(store, section)?;
        store.set_section_lock(id, locked)?;
        Ok(id)
    })?;
    let state = if locked { "Locked" } else { "Unlocked" };
    println!("{} section '{}'.", state, ctx.store.section(id)?.name);
    Ok(())
}

/// List sections ordered by start address.
pub fn list_sections_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_workspace(root)?;
    let sections: Vec<&Section> = ctx.store.project().sections_by_start();

    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    println!("Sections:");
    if sections.is_empty() {
        println!("(none)");
        return Ok(());
    }
    let hex = hex_for(&ctx);
    for section in sections {
        let lock = if section.locked { " [locked]" } else { "" };
        println!(
            "- #{} {}: {} - {} (size {}){}",
            section.id,
            section.name,
            hex(section.start),
            hex(section.end),
            hex(section.size()),
            lock
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct SectionView<'a> {
    section: &'a Section,
    entries: Vec<LayoutEntry>,
    available_modules: Vec<&'a str>,
}

/// Show one section: its module ranges interleaved with unclaimed gaps.
pub fn show_section_command(root: &str, section: &str, json: bool) -> Result<()> {
    let ctx = open_workspace(root)?;
    let store = &ctx.store;
    let section = resolve_section(store, section)?;
    let entries = store.section_layout(section.id)?;
    let available: Vec<&str> =
        store.modules_without_range(section.id)?.into_iter().map(|m| m.name.as_str()).collect();

    if json {
        let view = SectionView { section, entries, available_modules: available };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let hex = hex_for(&ctx);
    println!(
        "Section '{}' (#{}): {} - {}{}",
        section.name,
        section.id,
        hex(section.start),
        hex(section.end),
        if section.locked { " [locked]" } else { "" }
    );
    for entry in &entries {
        match entry {
            LayoutEntry::Range { module_name, range, .. } => println!(
                "  {:<24} {} - {} (size {}){}",
                module_name,
                hex(range.start),
                hex(range.end),
                hex(range.size()),
                if range.locked { " [locked]" } else { "" }
            ),
            LayoutEntry::Gap { start, end } => {
                let size = hex(end - start);
                println!("  {:<24} {} - {} (size {})", "(gap)", hex(*start), hex(*end), size)
            }
        }
    }
    if !available.is_empty() {
        println!("Modules without a range here: {}", available.join(", "));
    }
    Ok(())
}
