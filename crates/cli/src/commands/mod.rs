//! Command implementations.

pub mod notion;
pub mod shifts;

use shiftdesk_server::config::ConfigError;
use shiftdesk_server::store::{NotionError, StoreError};
use thiserror::Error;

pub use shifts::ExportFormat;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The command needs Notion but it is not configured.
    #[error("Notion is not configured: set NOTION_TOKEN and NOTION_DATABASE_ID")]
    NotionNotConfigured,

    /// Notion request failed.
    #[error(transparent)]
    Notion(#[from] NotionError),

    /// Reading shifts failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML encoding failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Could not write output: {0}")]
    Io(#[from] std::io::Error),
}
