//! Booking and cancellation notifications.
//!
//! Three independent channels, each with a live and a demo variant picked
//! once at startup:
//! - chat ([`DiscordNotifier`] or [`DemoNotifier`])
//! - email ([`EmailNotifier`] or [`DemoNotifier`])
//! - calendar ([`GoogleCalendar`] or [`DemoCalendar`])
//!
//! Sends are best-effort. Every attempt becomes a [`NotificationOutcome`];
//! failures are logged and reported, never propagated to the booking.

mod calendar;
mod demo;
pub mod discord;
mod email;

pub use calendar::{CalendarError, GoogleCalendar};
pub use demo::{DemoCalendar, DemoNotifier};
pub use discord::{DiscordError, DiscordNotifier};
pub use email::{EmailError, EmailNotifier};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shiftdesk_core::{ContactInfo, Shift, ShiftId, UserId};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Shown when a shift has no location.
pub const DEFAULT_LOCATION: &str = "Associazione Culturale";

/// A notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Discord,
    Email,
    Calendar,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discord => "discord",
            Self::Email => "email",
            Self::Calendar => "calendar",
        })
    }
}

/// Errors from any notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Discord(#[from] DiscordError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The contact has no address for this channel.
    #[error("no {0} address for this contact")]
    MissingAddress(Channel),
}

/// The result of one notification attempt, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    #[serde(rename = "type")]
    pub channel: Channel,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_url: Option<String>,
}

impl NotificationOutcome {
    #[must_use]
    pub fn sent(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            channel,
            success: true,
            message: message.into(),
            auth_url: None,
            event_url: None,
        }
    }

    #[must_use]
    pub fn failed(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::sent(channel, message)
        }
    }

    fn not_ready(channel: Channel) -> Self {
        Self::failed(channel, format!("{channel} notifications are not available right now"))
    }
}

/// Booking or cancellation messages on one channel (chat or email).
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    /// Whether this is a simulated channel.
    fn is_demo(&self) -> bool {
        false
    }

    /// Whether the live channel finished its one-time initialization.
    fn is_ready(&self) -> bool;

    /// Announce a booking, returning a short human-readable result.
    async fn notify_booking(&self, shift: &Shift, contact: &ContactInfo)
    -> Result<String, NotifyError>;

    /// Announce a cancellation, returning a short human-readable result.
    async fn notify_cancellation(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError>;
}

/// What scheduling a calendar event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarLink {
    /// The user must authorize access first; the event is created afterwards.
    AuthorizationRequired(String),
    /// The event exists at this URL.
    EventCreated(String),
}

/// Calendar invites for booked shifts.
#[async_trait]
pub trait CalendarScheduler: Send + Sync {
    /// Whether this is a simulated calendar.
    fn is_demo(&self) -> bool {
        false
    }

    fn is_ready(&self) -> bool;

    /// Start adding `shift` to the calendar of `user`.
    async fn schedule(
        &self,
        user: UserId,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<CalendarLink, NotifyError>;

    /// Finish an authorization started by [`CalendarScheduler::schedule`],
    /// creating every event pending for `user`. Returns the event URLs.
    async fn complete_authorization(
        &self,
        user: UserId,
        code: &str,
    ) -> Result<Vec<String>, NotifyError>;

    /// Remove the event created for a shift, if any.
    ///
    /// Returns `true` when an event was deleted.
    async fn unschedule(&self, shift: &ShiftId) -> Result<bool, NotifyError>;
}

/// The dispatchers selected at startup.
#[derive(Clone)]
pub struct Notifiers {
    pub chat: Arc<dyn Notifier>,
    pub email: Arc<dyn Notifier>,
    pub calendar: Arc<dyn CalendarScheduler>,
}

impl fmt::Debug for Notifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifiers")
            .field("chat_demo", &self.chat.is_demo())
            .field("email_demo", &self.email.is_demo())
            .field("calendar_demo", &self.calendar.is_demo())
            .finish()
    }
}

impl Notifiers {
    /// Simulated variants on every channel.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            chat: Arc::new(DemoNotifier::new(Channel::Discord)),
            email: Arc::new(DemoNotifier::new(Channel::Email)),
            calendar: Arc::new(DemoCalendar),
        }
    }

    /// Pick and initialize each channel from configuration.
    ///
    /// A configured channel whose initialization fails stays live but not
    /// ready, so requests for it report a failure instead of a simulation.
    pub async fn from_config(config: &ServerConfig) -> Self {
        let mut notifiers = Self::demo();

        if let Some(discord) = &config.discord {
            match DiscordNotifier::new(discord) {
                Ok(notifier) => {
                    if let Err(e) = notifier.initialize().await {
                        warn!(error = %e, "Discord initialization failed");
                    }
                    notifiers.chat = Arc::new(notifier);
                }
                Err(e) => warn!(error = %e, "Discord client could not be built"),
            }
        } else {
            info!("Discord not configured, using demo notifications");
        }

        if let Some(email) = &config.email {
            match EmailNotifier::new(email, &config.base_url) {
                Ok(notifier) => {
                    if let Err(e) = notifier.initialize().await {
                        warn!(error = %e, "SMTP initialization failed");
                    }
                    notifiers.email = Arc::new(notifier);
                }
                Err(e) => warn!(error = %e, "SMTP transport could not be built"),
            }
        } else {
            info!("SMTP not configured, using demo emails");
        }

        if let Some(google) = &config.google {
            notifiers.calendar = Arc::new(GoogleCalendar::new(google, &config.base_url));
        } else {
            info!("Google Calendar not configured, using demo events");
        }

        notifiers
    }
}

/// Send a booking message on one channel and report the outcome.
pub async fn booking_outcome(
    notifier: &dyn Notifier,
    shift: &Shift,
    contact: &ContactInfo,
) -> NotificationOutcome {
    let channel = notifier.channel();
    if !notifier.is_demo() && !notifier.is_ready() {
        return NotificationOutcome::not_ready(channel);
    }
    match notifier.notify_booking(shift, contact).await {
        Ok(message) => NotificationOutcome::sent(channel, message),
        Err(e) => {
            warn!(%channel, error = %e, "Booking notification failed");
            NotificationOutcome::failed(channel, format!("Could not send {channel} notification"))
        }
    }
}

/// Send a cancellation message on one channel and report the outcome.
pub async fn cancellation_outcome(
    notifier: &dyn Notifier,
    shift: &Shift,
    contact: &ContactInfo,
) -> NotificationOutcome {
    let channel = notifier.channel();
    if !notifier.is_demo() && !notifier.is_ready() {
        return NotificationOutcome::not_ready(channel);
    }
    match notifier.notify_cancellation(shift, contact).await {
        Ok(message) => NotificationOutcome::sent(channel, message),
        Err(e) => {
            warn!(%channel, error = %e, "Cancellation notification failed");
            NotificationOutcome::failed(channel, format!("Could not send {channel} notification"))
        }
    }
}

/// Schedule a calendar event and report the outcome.
pub async fn calendar_outcome(
    calendar: &dyn CalendarScheduler,
    user: UserId,
    shift: &Shift,
    contact: &ContactInfo,
) -> NotificationOutcome {
    if !calendar.is_demo() && !calendar.is_ready() {
        return NotificationOutcome::not_ready(Channel::Calendar);
    }
    match calendar.schedule(user, shift, contact).await {
        Ok(CalendarLink::AuthorizationRequired(url)) => NotificationOutcome {
            auth_url: Some(url),
            ..NotificationOutcome::sent(Channel::Calendar, "Google Calendar authorization required")
        },
        Ok(CalendarLink::EventCreated(url)) => NotificationOutcome {
            event_url: Some(url),
            ..NotificationOutcome::sent(
                Channel::Calendar,
                if calendar.is_demo() {
                    "Calendar event simulated (demo mode)"
                } else {
                    "Event added to the calendar"
                },
            )
        },
        Err(e) => {
            warn!(error = %e, "Calendar scheduling failed");
            NotificationOutcome::failed(Channel::Calendar, "Could not set up the calendar event")
        }
    }
}

/// Remove a shift's calendar event, reporting only when one existed.
pub async fn calendar_removal_outcome(
    calendar: &dyn CalendarScheduler,
    shift: &ShiftId,
) -> Option<NotificationOutcome> {
    match calendar.unschedule(shift).await {
        Ok(true) => Some(NotificationOutcome::sent(
            Channel::Calendar,
            "Event removed from the calendar",
        )),
        Ok(false) => None,
        Err(e) => {
            warn!(error = %e, "Calendar event removal failed");
            Some(NotificationOutcome::failed(
                Channel::Calendar,
                "Could not remove the calendar event",
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(NotificationOutcome::failed(
            Channel::Discord,
            "nope",
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "discord", "success": false, "message": "nope" })
        );

        let with_url = NotificationOutcome {
            auth_url: Some("https://accounts.google.com/o/oauth2/v2/auth".to_string()),
            ..NotificationOutcome::sent(Channel::Calendar, "authorize")
        };
        let json = serde_json::to_value(with_url).unwrap();
        assert_eq!(json["type"], "calendar");
        assert!(json.get("authUrl").is_some());
        assert!(json.get("eventUrl").is_none());
    }

    #[test]
    fn test_demo_notifiers_are_flagged() {
        let notifiers = Notifiers::demo();
        assert!(notifiers.chat.is_demo());
        assert!(!notifiers.chat.is_ready());
        assert_eq!(notifiers.email.channel(), Channel::Email);
        assert!(notifiers.calendar.is_demo());
    }
}
