//! Shiftdesk CLI - operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Export available shifts as JSON to stdout
//! shiftdesk shifts export
//!
//! # Export every shift as YAML to a file
//! shiftdesk shifts export --all --format yaml --output shifts.yaml
//!
//! # Check that the Notion database is reachable
//! shiftdesk notion verify
//! ```
//!
//! Shifts come from Notion when `NOTION_TOKEN` and `NOTION_DATABASE_ID` are
//! set, otherwise from the demo generator.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::ExportFormat;

#[derive(Parser)]
#[command(name = "shiftdesk")]
#[command(author, version, about = "Shiftdesk operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with shift records
    Shifts {
        #[command(subcommand)]
        action: ShiftsAction,
    },
    /// Check the Notion integration
    Notion {
        #[command(subcommand)]
        action: NotionAction,
    },
}

#[derive(Subcommand)]
enum ShiftsAction {
    /// Dump shifts to stdout or a file
    Export {
        /// Include booked and completed shifts
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum NotionAction {
    /// Check that the configured database is reachable
    Verify,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so exports on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Shifts { action } => match action {
            ShiftsAction::Export {
                all,
                format,
                output,
            } => commands::shifts::export(all, format, output.as_deref()).await,
        },
        Commands::Notion { action } => match action {
            NotionAction::Verify => commands::notion::verify().await,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_arguments() {
        let cli = Cli::try_parse_from([
            "shiftdesk", "shifts", "export", "--all", "--format", "yaml", "-o", "out.yaml",
        ])
        .unwrap();
        let Commands::Shifts {
            action: ShiftsAction::Export {
                all,
                format,
                output,
            },
        } = cli.command
        else {
            panic!("expected shifts export");
        };
        assert!(all);
        assert_eq!(format, ExportFormat::Yaml);
        assert_eq!(output, Some(PathBuf::from("out.yaml")));
    }

    #[test]
    fn test_export_defaults_to_json() {
        let cli = Cli::try_parse_from(["shiftdesk", "shifts", "export"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Shifts {
                action: ShiftsAction::Export {
                    all: false,
                    format: ExportFormat::Json,
                    output: None,
                },
            }
        ));
    }
}
