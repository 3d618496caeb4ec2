//! Booking contact details and notification preferences.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::email::{Email, EmailError};
use super::id::UserId;

/// Errors validating contact details.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("name is required")]
    MissingName,
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Who is booking or cancelling a shift, as submitted by the client.
///
/// `discordId` is also accepted as `chatHandle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_email"
    )]
    pub email: Option<Email>,
    #[serde(
        default,
        alias = "chatHandle",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_string"
    )]
    pub discord_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_string"
    )]
    pub notes: Option<String>,
    /// Registry user this booking belongs to, when the page was opened
    /// through a personal link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl ContactInfo {
    /// Contact with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trim the name and reject blank ones.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::MissingName` when the name is empty after trimming.
    pub fn validated(mut self) -> Result<Self, ContactError> {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return Err(ContactError::MissingName);
        }
        self.name = trimmed.to_string();
        Ok(self)
    }

    /// Numeric Discord user id, if the handle is one.
    #[must_use]
    pub fn discord_user_id(&self) -> Option<&str> {
        self.discord_id
            .as_deref()
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Which channels a registered user wants to be notified on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub enable_email: bool,
    #[serde(rename = "enableDiscord", alias = "enableChat")]
    pub enable_chat: bool,
    pub enable_calendar: bool,
}

impl NotificationPreferences {
    /// Defaults for a new user: a channel is on when its address is known.
    #[must_use]
    pub const fn for_contact(has_email: bool, has_chat: bool) -> Self {
        Self {
            enable_email: has_email,
            enable_chat: has_chat,
            enable_calendar: false,
        }
    }
}

fn blank_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn blank_email<'de, D>(deserializer: D) -> Result<Option<Email>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Email::parse_optional(raw.as_deref()).map_err(serde::de::Error::custom)
}
