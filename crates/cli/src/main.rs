use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use exemap::commands::{
    add_module_command, add_range_command, add_section_command, bar_command,
    clear_exe_range_command, delete_module_command, delete_section_command,
    export_reports_command, init_project_command, list_modules_command, list_sections_command,
    move_range_command, project_info_command, remove_range_command, rename_module_command,
    report_command, set_exe_range_command, set_range_lock_command, set_section_lock_command,
    show_section_command, update_range_command, update_section_command, where_command,
    ReportFormat, ReportKind,
};
use exemap::logging::{init_logging, LogConfig};

/// Executable layout mapper CLI.
///
/// This CLI is a thin wrapper around `exemap-core` (exposed in code as `exemap_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
///
/// Sections and modules are referenced by name (modules ignore case) or by
/// id as `#<id>`. Addresses are hexadecimal: `0x1000`, `1000h`, or `1000`.
#[derive(Parser, Debug)]
#[command(
    name = "exemap",
    version,
    about = "Map sections and modules over an executable's address space",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new exemap workspace at the given root.
    ///
    /// This will:
    /// - Create a `.exemap` metadata directory and a `reports` directory.
    /// - Write `.exemap/config.json`.
    /// - Write an empty project document unless one already exists.
    InitProject {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional workspace name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },

    /// Show workspace paths and a summary of the project.
    ProjectInfo {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Set the executable range every section must fit inside.
    SetExeRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Remove the executable range.
    ClearExeRange {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Add a section. Sections may not overlap each other.
    AddSection {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Create the section locked.
        #[arg(long, default_value_t = false)]
        locked: bool,
    },

    /// Rename and/or move a section. Omitted values are kept.
    UpdateSection {
        #[arg(long, default_value = ".")]
        root: String,
        /// Section name or `#<id>`.
        section: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a section. Module ranges in it must be removed first.
    DeleteSection {
        #[arg(long, default_value = ".")]
        root: String,
        section: String,
    },

    /// Lock a section against edits and deletion.
    LockSection {
        #[arg(long, default_value = ".")]
        root: String,
        section: String,
    },

    /// Unlock a section.
    UnlockSection {
        #[arg(long, default_value = ".")]
        root: String,
        section: String,
    },

    /// List sections ordered by start address.
    ListSections {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show a section's module ranges and the gaps between them.
    ShowSection {
        #[arg(long, default_value = ".")]
        root: String,
        section: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Add a module. Names are unique ignoring case.
    AddModule {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        name: String,
    },

    /// Rename a module.
    RenameModule {
        #[arg(long, default_value = ".")]
        root: String,
        /// Module name or `#<id>`.
        module: String,
        #[arg(long)]
        name: String,
    },

    /// Delete a module and all of its ranges.
    DeleteModule {
        #[arg(long, default_value = ".")]
        root: String,
        module: String,
    },

    /// List modules with their ranges.
    ListModules {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Give a module a range inside a section (one range per section).
    AddRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        section: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = false)]
        locked: bool,
    },

    /// Change a module's range, optionally moving it into another section.
    UpdateRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        section: String,
        /// Move the range into this section.
        #[arg(long)]
        to_section: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Hand a range over to another module.
    MoveRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        section: String,
    },

    /// Lock a module's range against edits and removal.
    LockRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        section: String,
    },

    /// Unlock a module's range.
    UnlockRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        section: String,
    },

    /// Remove a module's range from a section.
    RemoveRange {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        section: String,
    },

    /// Print an analysis report.
    Report {
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long, value_enum)]
        kind: ReportKind,
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<String>,
    },

    /// Write section holes, module holes, and overlaps as CSV under `reports/`.
    ExportReports {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Report which section and module own an address.
    Where {
        #[arg(long, default_value = ".")]
        root: String,
        address: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Draw the executable's coverage as a text bar.
    Bar {
        #[arg(long, default_value = ".")]
        root: String,
        /// Bar width in characters.
        #[arg(long, default_value_t = 72)]
        width: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose))?;

    match cli.command {
        Command::InitProject { root, name, description } => {
            init_project_command(&root, name, description)?
        }
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::SetExeRange { root, start, end } => set_exe_range_command(&root, &start, &end)?,
        Command::ClearExeRange { root } => clear_exe_range_command(&root)?,
        Command::AddSection { root, name, start, end, locked } => {
            add_section_command(&root, &name, &start, &end, locked)?
        }
        Command::UpdateSection { root, section, name, start, end } => update_section_command(
            &root,
            &section,
            name.as_deref(),
            start.as_deref(),
            end.as_deref(),
        )?,
        Command::DeleteSection { root, section } => delete_section_command(&root, &section)?,
        Command::LockSection { root, section } => set_section_lock_command(&root, &section, true)?,
        Command::UnlockSection { root, section } => {
            set_section_lock_command(&root, &section, false)?
        }
        Command::ListSections { root, json } => list_sections_command(&root, json)?,
        Command::ShowSection { root, section, json } => {
            show_section_command(&root, &section, json)?
        }
        Command::AddModule { root, name } => add_module_command(&root, &name)?,
        Command::RenameModule { root, module, name } => {
            rename_module_command(&root, &module, &name)?
        }
        Command::DeleteModule { root, module } => delete_module_command(&root, &module)?,
        Command::ListModules { root, json } => list_modules_command(&root, json)?,
        Command::AddRange { root, module, section, start, end, locked } => {
            add_range_command(&root, &module, &section, &start, &end, locked)?
        }
        Command::UpdateRange { root, module, section, to_section, start, end } => {
            update_range_command(
                &root,
                &module,
                &section,
                to_section.as_deref(),
                start.as_deref(),
                end.as_deref(),
            )?
        }
        Command::MoveRange { root, from, to, section } => {
            move_range_command(&root, &from, &to, &section)?
        }
        Command::LockRange { root, module, section } => {
            set_range_lock_command(&root, &module, &section, true)?
        }
        Command::UnlockRange { root, module, section } => {
            set_range_lock_command(&root, &module, &section, false)?
        }
        Command::RemoveRange { root, module, section } => {
            remove_range_command(&root, &module, &section)?
        }
        Command::Report { root, kind, format, out } => {
            report_command(&root, kind, format, out.as_deref())?
        }
        Command::ExportReports { root } => export_reports_command(&root)?,
        Command::Where { root, address, json } => where_command(&root, &address, json)?,
        Command::Bar { root, width } => bar_command(&root, width)?,
    }

    Ok(())
}
