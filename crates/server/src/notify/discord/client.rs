//! Discord REST API client.
//!
//! Sends embeds to the configured channel and direct messages to users.
//! Only the REST API is used; the bot never connects to the gateway.

use reqwest::{Client, RequestBuilder, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::error::DiscordError;
use super::types::{ApiErrorBody, CreateDm, CreateMessage, CurrentUser, DmChannel, Embed, Message};

/// Discord REST API base URL.
const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Discord API client authenticated as a bot.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    bot_token: SecretString,
    channel_id: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("bot_token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Create a new Discord client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(bot_token: SecretString, channel_id: String) -> Result<Self, DiscordError> {
        Ok(Self {
            client: Client::builder().build()?,
            bot_token,
            channel_id,
        })
    }

    /// Channel that receives booking announcements.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            AUTHORIZATION,
            format!("Bot {}", self.bot_token.expose_secret()),
        )
    }

    /// Fetch the bot user, verifying the token.
    ///
    /// # Errors
    ///
    /// Returns `DiscordError::Unauthorized` for a rejected token.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<CurrentUser, DiscordError> {
        let response = self
            .authorized(self.client.get(format!("{DISCORD_API_BASE}/users/@me")))
            .send()
            .await?;
        handle_response(response).await
    }

    /// Post embeds to a channel.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Discord rejects the message.
    #[instrument(skip(self, embeds), fields(channel = %channel))]
    pub async fn post_embeds(
        &self,
        channel: &str,
        embeds: Vec<Embed>,
    ) -> Result<Message, DiscordError> {
        let body = CreateMessage {
            content: None,
            embeds,
        };
        let response = self
            .authorized(
                self.client
                    .post(format!("{DISCORD_API_BASE}/channels/{channel}/messages")),
            )
            .json(&body)
            .send()
            .await?;
        let message: Message = handle_response(response).await?;

        debug!(message_id = %message.id, "Message posted to Discord");
        Ok(message)
    }

    /// Open (or reuse) the DM channel with a user.
    ///
    /// # Errors
    ///
    /// Returns error if the user cannot be messaged by the bot.
    #[instrument(skip(self))]
    pub async fn open_dm(&self, recipient_id: &str) -> Result<DmChannel, DiscordError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{DISCORD_API_BASE}/users/@me/channels")),
            )
            .json(&CreateDm { recipient_id })
            .send()
            .await?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DiscordError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        warn!(retry_after, "Discord rate limit hit");
        return Err(DiscordError::RateLimited(retry_after));
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(DiscordError::Unauthorized);
    }

    let message = response
        .json::<ApiErrorBody>()
        .await
        .map_or_else(|_| "Unknown error".to_string(), |b| b.message);
    Err(DiscordError::Api {
        status: status.as_u16(),
        message,
    })
}
