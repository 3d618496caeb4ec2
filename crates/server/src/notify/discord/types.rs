//! Discord REST API types.
//!
//! A subset of the message and embed objects.
//!
//! See: <https://discord.com/developers/docs/resources/message>

use serde::{Deserialize, Serialize};

/// Body of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

/// A rich embed.
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

/// A name/value pair inside an embed.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    /// Field shown side by side with its neighbours.
    #[must_use]
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }

    /// Field spanning the full embed width.
    #[must_use]
    pub fn block(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            inline: false,
            ..Self::inline(name, value)
        }
    }
}

/// Embed footer.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Body of `POST /users/@me/channels`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDm<'a> {
    pub recipient_id: &'a str,
}

/// A created message; only the ID is read.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
}

/// A channel; only the ID is read.
#[derive(Debug, Clone, Deserialize)]
pub struct DmChannel {
    pub id: String,
}

/// The bot user returned by `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

/// Discord error object.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

