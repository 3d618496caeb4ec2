//! Mapping between Notion pages and shifts.
//!
//! The database schema is external and keeps its Italian property names and
//! status labels.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};
use shiftdesk_core::{ContactInfo, Email, Occupant, Shift, ShiftId, ShiftStatus};

use super::error::NotionError;
use super::types::Page;

pub const TITLE: &str = "Titolo";
pub const DESCRIPTION: &str = "Descrizione";
pub const DATE: &str = "Data";
pub const START_TIME: &str = "Ora Inizio";
pub const END_TIME: &str = "Ora Fine";
pub const LOCATION: &str = "Luogo";
pub const STATUS: &str = "Stato";
pub const OCCUPANT: &str = "Utente";
pub const EMAIL: &str = "Email";
pub const DISCORD_ID: &str = "Discord ID";
pub const NOTES: &str = "Note";
pub const BOOKED_ON: &str = "Data Prenotazione";

/// Label of a status in the Notion select.
#[must_use]
pub const fn status_label(status: ShiftStatus) -> &'static str {
    match status {
        ShiftStatus::Available => "Disponibile",
        ShiftStatus::Booked => "Prenotato",
        ShiftStatus::Completed => "Completato",
    }
}

/// Status for a Notion select label.
#[must_use]
pub fn status_from_label(label: &str) -> Option<ShiftStatus> {
    ShiftStatus::ALL
        .into_iter()
        .find(|s| status_label(*s).eq_ignore_ascii_case(label.trim()))
}

/// Read the status select of a page without converting the rest.
#[must_use]
pub fn page_status(page: &Page) -> Option<ShiftStatus> {
    text(page, STATUS).and_then(|label| status_from_label(&label))
}

/// Convert a database page into a shift.
///
/// # Errors
///
/// Returns `NotionError::MalformedPage` when the date, times or status
/// cannot be read, or when the shift does not end after it starts.
pub fn page_to_shift(page: &Page) -> Result<Shift, NotionError> {
    let malformed = |reason: String| NotionError::MalformedPage {
        page_id: page.id.clone(),
        reason,
    };

    let date = required(page, DATE)
        .and_then(|raw| Shift::parse_date(&raw).map_err(|e| e.to_string()))
        .map_err(malformed)?;
    let start_time = required(page, START_TIME)
        .and_then(|raw| Shift::parse_time(&raw).map_err(|e| e.to_string()))
        .map_err(malformed)?;
    let end_time = required(page, END_TIME)
        .and_then(|raw| Shift::parse_time(&raw).map_err(|e| e.to_string()))
        .map_err(malformed)?;
    Shift::validate_interval(start_time, end_time).map_err(|e| malformed(e.to_string()))?;
    let status = required(page, STATUS)
        .and_then(|raw| status_from_label(&raw).ok_or_else(|| format!("unknown status '{raw}'")))
        .map_err(malformed)?;

    let occupant = (status == ShiftStatus::Booked)
        .then(|| text(page, OCCUPANT))
        .flatten()
        .map(|name| Occupant {
            name,
            email: text(page, EMAIL).and_then(|raw| Email::parse(&raw).ok()),
            discord_id: text(page, DISCORD_ID),
            notes: text(page, NOTES),
        });

    Ok(Shift {
        id: ShiftId::new(page.id.clone()),
        title: text(page, TITLE).unwrap_or_default(),
        description: text(page, DESCRIPTION).unwrap_or_default(),
        date,
        start_time,
        end_time,
        location: text(page, LOCATION).unwrap_or_default(),
        status,
        occupant,
        created_time: timestamp(&page.created_time),
        last_edited_time: timestamp(&page.last_edited_time),
    })
}

/// Properties that move a page to `Prenotato` for `contact`.
#[must_use]
pub fn booking_properties(contact: &ContactInfo, booked_on: NaiveDate) -> Value {
    json!({
        STATUS: { "select": { "name": status_label(ShiftStatus::Booked) } },
        OCCUPANT: rich_text(&contact.name),
        EMAIL: { "email": contact.email.as_ref().map(Email::as_str) },
        DISCORD_ID: rich_text(contact.discord_id.as_deref().unwrap_or_default()),
        NOTES: rich_text(contact.notes.as_deref().unwrap_or_default()),
        BOOKED_ON: { "date": { "start": booked_on.format("%Y-%m-%d").to_string() } },
    })
}

/// Properties that return a page to `Disponibile` and clear the occupant.
#[must_use]
pub fn release_properties() -> Value {
    json!({
        STATUS: { "select": { "name": status_label(ShiftStatus::Available) } },
        OCCUPANT: rich_text(""),
        EMAIL: { "email": null },
        DISCORD_ID: rich_text(""),
        NOTES: rich_text(""),
        BOOKED_ON: { "date": null },
    })
}

/// Filter matching pages in the given status.
#[must_use]
pub fn status_filter(status: ShiftStatus) -> Value {
    json!({ "property": STATUS, "select": { "equals": status_label(status) } })
}

fn rich_text(content: &str) -> Value {
    if content.is_empty() {
        return json!({ "rich_text": [] });
    }
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

fn text(page: &Page, property: &str) -> Option<String> {
    page.properties.get(property).and_then(|p| p.as_text())
}

fn required(page: &Page, property: &str) -> Result<String, String> {
    text(page, property).ok_or_else(|| format!("missing '{property}'"))
}

fn timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc))
}
