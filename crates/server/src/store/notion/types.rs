//! Notion REST API types.
//!
//! A subset of the page and database objects, enough to read and write the
//! shift database.
//!
//! See: <https://developers.notion.com/reference/intro>

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page in the shift database.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    pub created_time: String,
    pub last_edited_time: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

/// A property value on a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Date { date: Option<DateValue> },
    Select { select: Option<SelectOption> },
    Status { status: Option<SelectOption> },
    Email { email: Option<String> },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Plain-text reading of the value, `None` when empty.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        let text: String = match self {
            Self::Title { title: parts } | Self::RichText { rich_text: parts } => {
                parts.iter().map(|p| p.plain_text.as_str()).collect()
            }
            Self::Date { date } => date.as_ref()?.start.clone(),
            Self::Select { select: option } | Self::Status { status: option } => {
                option.as_ref()?.name.clone()
            }
            Self::Email { email } => email.clone()?,
            Self::Unsupported => return None,
        };
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// A rich text fragment.
#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// A date property value.
#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    pub start: String,
}

/// A select or status option.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// Response of `POST /databases/{id}/query`.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Request body of `POST /databases/{id}/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    pub page_size: u8,
}

/// A sort criterion for database queries.
#[derive(Debug, Clone, Serialize)]
pub struct Sort {
    pub property: &'static str,
    pub direction: &'static str,
}

impl Sort {
    /// Ascending sort on a property.
    #[must_use]
    pub const fn ascending(property: &'static str) -> Self {
        Self {
            property,
            direction: "ascending",
        }
    }
}

/// Response of `GET /databases/{id}`, only the title is read.
#[derive(Debug, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichText>,
}

impl Database {
    /// Database title as plain text.
    #[must_use]
    pub fn title_text(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }
}

/// Notion error object.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
