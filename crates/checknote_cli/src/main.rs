//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `checknote_core` linkage with deterministic output.
//! - Run a scripted editing session and export persisted checklists.
//!
//! `CHECKNOTE_DB_PATH` selects the database file and `CHECKNOTE_LOG_DIR`
//! enables file logging.

use checknote_core::db::open_db;
use checknote_core::{
    default_log_level, init_logging, to_html, to_json, to_text, ChecklistNote,
    ChecklistRepository, ListManager, ListManagerConfig, SortPolicy, SqliteChecklistRepository,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

const DB_PATH_ENV: &str = "CHECKNOTE_DB_PATH";
const LOG_DIR_ENV: &str = "CHECKNOTE_LOG_DIR";

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Checklist engine smoke binary. Without a command it prints ping and version.
#[derive(Parser, Debug)]
#[command(name = "checknote_cli")]
#[command(about = "Nested checklist editing and export")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run a scripted editing session with undo and redo
    Demo {
        /// Persist the resulting checklist
        #[arg(long)]
        save: bool,
    },
    /// Print one persisted checklist
    Export {
        /// Note uuid as printed by `demo --save`
        uuid: Uuid,
        #[arg(value_enum, default_value = "text")]
        format: ExportFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Text,
    Html,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let result = match cli.command {
        None => {
            println!("checknote_core ping={}", checknote_core::ping());
            println!("checknote_core version={}", checknote_core::core_version());
            Ok(())
        }
        Some(Command::Demo { save }) => run_demo(save),
        Some(Command::Export { uuid, format }) => run_export(uuid, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(save: bool) -> CliResult<()> {
    let mut manager = ListManager::new(ListManagerConfig {
        sort_policy: SortPolicy::CheckedFirst,
        ..ListManagerConfig::default()
    });

    for (position, body) in ["Groceries", "Milk", "Bread", "Laundry"].iter().enumerate() {
        let item = manager.create_item(*body)?;
        manager.add(position, Some(item))?;
    }
    manager.change_is_child(1, true)?;
    manager.change_is_child(2, true)?;
    manager.change_checked(0, true)?;
    println!("after edits:\n{}\n", manager.display_body());

    manager.undo()?;
    println!("after undo:\n{}\n", manager.display_body());
    manager.redo()?;
    println!("after redo:\n{}", manager.display_body());

    if save {
        let conn = open_db(db_path())?;
        let repo = SqliteChecklistRepository::new(&conn);
        let mut note = ChecklistNote::new("Demo");
        note.items = manager.items();
        repo.save_note(&note)?;
        repo.save_config(note.uuid, &manager.config())?;
        info!("event=cli_demo_save module=cli status=ok note={}", note.uuid);
        println!("\nsaved note {}", note.uuid);
    }
    Ok(())
}

fn run_export(uuid: Uuid, format: ExportFormat) -> CliResult<()> {
    let conn = open_db(db_path())?;
    let repo = SqliteChecklistRepository::new(&conn);
    let note = repo
        .get_note(uuid)?
        .ok_or_else(|| format!("note {uuid} not found"))?;

    match format {
        ExportFormat::Text => println!("{}", to_text(&note)),
        ExportFormat::Html => println!("{}", to_html(&note.title, &note.items)),
        ExportFormat::Json => println!("{}", to_json(&note)?),
    }
    Ok(())
}

fn db_path() -> PathBuf {
    std::env::var_os(DB_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("checknote.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ExportFormat};
    use clap::{CommandFactory, Parser};

    const NOTE: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_has_no_command() {
        let cli = Cli::try_parse_from(["checknote_cli"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn export_defaults_to_text_and_accepts_html() {
        let cli = Cli::try_parse_from(["checknote_cli", "export", NOTE]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Export {
                format: ExportFormat::Text,
                ..
            })
        ));

        let cli = Cli::try_parse_from(["checknote_cli", "export", NOTE, "html"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Export {
                format: ExportFormat::Html,
                ..
            })
        ));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["checknote_cli", "demo", "--sav"]).is_err());
        assert!(Cli::try_parse_from(["checknote_cli", "export", "not-a-uuid"]).is_err());
        assert!(Cli::try_parse_from(["checknote_cli", "export", NOTE, "pdf"]).is_err());
        assert!(Cli::try_parse_from(["checknote_cli", "frobnicate"]).is_err());
    }

    #[test]
    fn demo_save_flag_is_parsed() {
        let cli = Cli::try_parse_from(["checknote_cli", "demo", "--save"]).unwrap();
        assert_eq!(cli.command, Some(Command::Demo { save: true }));
    }
}
