//! Shift export.

use std::io::Write;
use std::path::Path;

use clap::ValueEnum;
use shiftdesk_core::Shift;
use shiftdesk_server::config::NotionConfig;
use shiftdesk_server::store::{DemoStore, NotionStore, ShiftStore};
use tracing::info;

use super::CliError;

/// Output format for exported shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
}

/// Export shifts from the configured store.
///
/// # Arguments
///
/// * `all` - Include booked and completed shifts, not only available ones
/// * `format` - Serialization format
/// * `output` - Destination file; stdout when `None`
///
/// # Errors
///
/// Returns an error if the store cannot be read or the output cannot be
/// written.
pub async fn export(all: bool, format: ExportFormat, output: Option<&Path>) -> Result<(), CliError> {
    let store: Box<dyn ShiftStore> = match NotionConfig::from_env()? {
        Some(config) => Box::new(NotionStore::new(&config)?),
        None => {
            info!("Notion not configured, exporting demo shifts");
            Box::new(DemoStore::generate())
        }
    };

    let shifts = if all {
        store.list_all().await?
    } else {
        store.list_available().await?
    };
    let rendered = render(&shifts, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!(count = shifts.len(), path = %path.display(), "Shifts exported");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Serialize shifts in the requested format, newline-terminated.
fn render(shifts: &[Shift], format: ExportFormat) -> Result<String, CliError> {
    let mut rendered = match format {
        ExportFormat::Json => serde_json::to_string_pretty(shifts)?,
        ExportFormat::Yaml => serde_yaml::to_string(shifts)?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}
