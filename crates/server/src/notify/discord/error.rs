//! Discord-related errors.

use thiserror::Error;

/// Errors that can occur when talking to the Discord API.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// HTTP request failed.
    #[error("Discord request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Discord returned an error object.
    #[error("Discord API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited, retry after the given seconds.
    #[error("Discord rate limited, retry after {0}s")]
    RateLimited(u64),

    /// The bot token was rejected.
    #[error("Discord bot token rejected")]
    Unauthorized,
}
