//! Notion integration checks.

use shiftdesk_server::config::NotionConfig;
use shiftdesk_server::store::NotionStore;
use tracing::info;

use super::CliError;

/// Check that the configured database is reachable and shared with the
/// integration.
///
/// # Errors
///
/// Returns an error when Notion is not configured or the database cannot be
/// retrieved.
pub async fn verify() -> Result<(), CliError> {
    let config = NotionConfig::from_env()?.ok_or(CliError::NotionNotConfigured)?;
    let store = NotionStore::new(&config)?;

    let title = store.verify().await?;
    info!(database_id = %config.database_id, %title, "Notion database is reachable");
    Ok(())
}
