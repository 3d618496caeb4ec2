//! Notion-related errors.

use thiserror::Error;

/// Errors that can occur when talking to the Notion API.
#[derive(Debug, Error)]
pub enum NotionError {
    /// HTTP request failed.
    #[error("Notion request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Notion returned an error object.
    #[error("Notion API error ({status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The page or database does not exist or is not shared with the integration.
    #[error("Notion object not found: {0}")]
    NotFound(String),

    /// Rate limited, retry after the given seconds.
    #[error("Notion rate limited, retry after {0}s")]
    RateLimited(u64),

    /// A page could not be read as a shift.
    #[error("Malformed shift page {page_id}: {reason}")]
    MalformedPage { page_id: String, reason: String },
}
