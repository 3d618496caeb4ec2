//! Discord chat notifications.
//!
//! This module provides:
//! - [`DiscordClient`] for posting embeds and opening DM channels
//! - embed types and builders for booking and cancellation announcements
//! - [`DiscordNotifier`], the live chat channel
//!
//! Bookings are announced in the configured channel. When the booker's
//! handle is a numeric Discord user ID they also get a private confirmation;
//! failure to deliver it does not fail the notification.

mod client;
mod error;
mod messages;
mod types;

pub use client::DiscordClient;
pub use error::DiscordError;
pub use messages::{
    build_booking_embed, build_cancellation_embed, build_confirmation_dm, format_date,
};
pub use types::{Embed, EmbedField, EmbedFooter};

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use shiftdesk_core::{ContactInfo, Shift};
use tracing::{info, instrument, warn};

use super::{Channel, Notifier, NotifyError};
use crate::config::DiscordConfig;

/// Live chat channel backed by a Discord bot.
#[derive(Debug)]
pub struct DiscordNotifier {
    client: DiscordClient,
    ready: AtomicBool,
}

impl DiscordNotifier {
    /// Create a notifier; it stays not ready until [`Self::initialize`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &DiscordConfig) -> Result<Self, DiscordError> {
        Ok(Self {
            client: DiscordClient::new(config.bot_token.clone(), config.channel_id.clone())?,
            ready: AtomicBool::new(false),
        })
    }

    /// Verify the bot token and mark the channel ready.
    ///
    /// # Errors
    ///
    /// Returns error if Discord rejects the token or cannot be reached.
    pub async fn initialize(&self) -> Result<(), DiscordError> {
        let user = self.client.current_user().await?;
        self.ready.store(true, Ordering::Release);
        info!(bot_id = %user.id, bot = %user.username, "Discord bot connected");
        Ok(())
    }

    async fn send_confirmation_dm(&self, recipient: &str, shift: &Shift) -> Result<(), DiscordError> {
        let dm = self.client.open_dm(recipient).await?;
        self.client
            .post_embeds(&dm.id, vec![build_confirmation_dm(shift, Utc::now())])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn channel(&self) -> Channel {
        Channel::Discord
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    #[instrument(skip(self, shift, contact), fields(shift_id = %shift.id))]
    async fn notify_booking(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError> {
        let embed = build_booking_embed(shift, contact, Utc::now());
        let message = self
            .client
            .post_embeds(self.client.channel_id(), vec![embed])
            .await?;
        info!(message_id = %message.id, "Booking announced on Discord");

        if let Some(recipient) = contact.discord_user_id()
            && let Err(e) = self.send_confirmation_dm(recipient, shift).await
        {
            warn!(error = %e, "Could not DM booking confirmation");
        }

        Ok("Notification sent on Discord".to_string())
    }

    #[instrument(skip(self, shift, contact), fields(shift_id = %shift.id))]
    async fn notify_cancellation(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError> {
        let embed = build_cancellation_embed(shift, contact, Utc::now());
        let message = self
            .client
            .post_embeds(self.client.channel_id(), vec![embed])
            .await?;
        info!(message_id = %message.id, "Cancellation announced on Discord");

        Ok("Cancellation notification sent on Discord".to_string())
    }
}
