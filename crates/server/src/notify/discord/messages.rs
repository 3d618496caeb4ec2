//! Embed builders for booking announcements.

use chrono::{DateTime, NaiveDate, Utc};
use shiftdesk_core::{ContactInfo, Shift};

use super::types::{Embed, EmbedField, EmbedFooter};
use crate::notify::DEFAULT_LOCATION;

const GREEN: u32 = 0x00_ff_00;
const RED: u32 = 0xff_00_00;
const FOOTER: &str = "Shiftdesk";

/// Channel announcement for a new booking.
#[must_use]
pub fn build_booking_embed(shift: &Shift, contact: &ContactInfo, at: DateTime<Utc>) -> Embed {
    let mut fields = vec![
        EmbedField::inline("📅 Date", format_date(shift.date)),
        EmbedField::inline("⏰ Time", shift.time_label()),
        EmbedField::inline("📍 Location", location(shift)),
        EmbedField::inline("👤 User", contact.name.as_str()),
        EmbedField::inline(
            "📧 Email",
            contact
                .email
                .as_ref()
                .map_or("Not provided", |e| e.as_str()),
        ),
        EmbedField::inline(
            "🆔 Discord",
            contact.discord_id.as_deref().unwrap_or("Not provided"),
        ),
    ];
    if let Some(notes) = &contact.notes {
        fields.push(EmbedField::block("📝 Notes", notes.as_str()));
    }

    Embed {
        title: "🎯 New shift booked!".to_string(),
        description: Some(format!("**{}** booked a shift", contact.name)),
        color: GREEN,
        fields,
        timestamp: Some(at.to_rfc3339()),
        footer: Some(EmbedFooter {
            text: FOOTER.to_string(),
        }),
    }
}

/// Channel announcement for a cancelled booking.
#[must_use]
pub fn build_cancellation_embed(shift: &Shift, contact: &ContactInfo, at: DateTime<Utc>) -> Embed {
    Embed {
        title: "❌ Shift cancelled".to_string(),
        description: Some(format!("**{}** cancelled a shift", contact.name)),
        color: RED,
        fields: vec![
            EmbedField::inline("📅 Date", format_date(shift.date)),
            EmbedField::inline("⏰ Time", shift.time_label()),
            EmbedField::inline("👤 User", contact.name.as_str()),
        ],
        timestamp: Some(at.to_rfc3339()),
        footer: Some(EmbedFooter {
            text: FOOTER.to_string(),
        }),
    }
}

/// Private confirmation sent to the booker.
#[must_use]
pub fn build_confirmation_dm(shift: &Shift, at: DateTime<Utc>) -> Embed {
    Embed {
        title: format!("✅ {}", shift.title),
        description: Some("Your shift is confirmed. See you there!".to_string()),
        color: GREEN,
        fields: vec![
            EmbedField::inline("📅 Date", format_date(shift.date)),
            EmbedField::inline("⏰ Time", shift.time_label()),
            EmbedField::inline("📍 Location", location(shift)),
        ],
        timestamp: Some(at.to_rfc3339()),
        footer: Some(EmbedFooter {
            text: FOOTER.to_string(),
        }),
    }
}

/// Long date, e.g. `Friday 7 March 2025`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

fn location(shift: &Shift) -> &str {
    if shift.location.is_empty() {
        DEFAULT_LOCATION
    } else {
        &shift.location
    }
}
