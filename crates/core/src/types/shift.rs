//! Shift records and their state transitions.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contact::ContactInfo;
use super::email::Email;
use super::id::ShiftId;
use super::status::ShiftStatus;

/// Errors building a shift from raw values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("shift must end after it starts ({start} - {end})")]
    EndsBeforeStart { start: String, end: String },
}

/// The volunteer holding a booked shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Occupant {
    /// Whether this occupant is the given person, matched by display name.
    ///
    /// Names are compared trimmed and case-insensitively; this is the only
    /// identity check the booking model has.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

impl From<&ContactInfo> for Occupant {
    fn from(contact: &ContactInfo) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            discord_id: contact.discord_id.clone(),
            notes: contact.notes.clone(),
        }
    }
}

/// Compare two display names the way bookings are attributed.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// A schedulable time block at a location that a volunteer can claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub location: String,
    pub status: ShiftStatus,
    /// Present only while the shift is booked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupant: Option<Occupant>,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
}

impl Shift {
    /// Parse a clock time in `HH:MM` form.
    ///
    /// # Errors
    ///
    /// Returns `TimeRangeError::InvalidTime` if the input is not a valid time.
    pub fn parse_time(value: &str) -> Result<NaiveTime, TimeRangeError> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map_err(|_| TimeRangeError::InvalidTime(value.to_string()))
    }

    /// Parse a calendar date in `YYYY-MM-DD` form.
    ///
    /// Values carrying a time component (`2025-03-01T18:00:00`) keep only the date.
    ///
    /// # Errors
    ///
    /// Returns `TimeRangeError::InvalidDate` if no date can be read.
    pub fn parse_date(value: &str) -> Result<NaiveDate, TimeRangeError> {
        let day = value.trim().get(..10).unwrap_or_default();
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|_| TimeRangeError::InvalidDate(value.to_string()))
    }

    /// Validate that a start/end pair forms a non-empty interval.
    ///
    /// # Errors
    ///
    /// Returns `TimeRangeError::EndsBeforeStart` if `end <= start`.
    pub fn validate_interval(start: NaiveTime, end: NaiveTime) -> Result<(), TimeRangeError> {
        if end <= start {
            return Err(TimeRangeError::EndsBeforeStart {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(())
    }

    /// Sort key used everywhere shifts are listed: date, then start time.
    #[must_use]
    pub const fn schedule_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.start_time)
    }

    /// Whether this shift is booked by someone with the given name.
    #[must_use]
    pub fn is_booked_by(&self, name: &str) -> bool {
        self.status == ShiftStatus::Booked
            && self.occupant.as_ref().is_some_and(|o| o.is_named(name))
    }

    /// Apply the `Available -> Booked` transition.
    ///
    /// Callers must have checked availability and conflicts first.
    pub fn mark_booked(&mut self, occupant: Occupant, at: DateTime<Utc>) {
        self.status = ShiftStatus::Booked;
        self.occupant = Some(occupant);
        self.last_edited_time = at;
    }

    /// Apply the `Booked -> Available` transition, clearing the occupant.
    pub fn release(&mut self, at: DateTime<Utc>) {
        self.status = ShiftStatus::Available;
        self.occupant = None;
        self.last_edited_time = at;
    }

    /// `HH:MM - HH:MM` label for messages and templates.
    #[must_use]
    pub fn time_label(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// Counts of shifts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftStats {
    pub total: usize,
    pub available: usize,
    pub booked: usize,
    pub completed: usize,
}

impl ShiftStats {
    /// Count a sequence of statuses.
    pub fn tally(statuses: impl IntoIterator<Item = ShiftStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut acc, status| {
            acc.total += 1;
            match status {
                ShiftStatus::Available => acc.available += 1,
                ShiftStatus::Booked => acc.booked += 1,
                ShiftStatus::Completed => acc.completed += 1,
            }
            acc
        })
    }
}

/// Serde helpers for `HH:MM` clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a time as `HH:MM`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    /// Deserialize a time from `HH:MM` (seconds are accepted and kept).
    ///
    /// # Errors
    ///
    /// Returns an error for anything that is not a clock time.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Shift {
        let now = Utc::now();
        Shift {
            id: ShiftId::new("s1"),
            title: "Turno Serale Bar".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            start_time: Shift::parse_time("18:00").unwrap(),
            end_time: Shift::parse_time("22:00").unwrap(),
            location: "Sala Principale".to_string(),
            status: ShiftStatus::Available,
            occupant: None,
            created_time: now,
            last_edited_time: now,
        }
    }

    #[test]
    fn test_book_then_release_clears_occupant() {
        let mut shift = sample();
        let occupant = Occupant {
            name: "Anna".to_string(),
            email: None,
            discord_id: None,
            notes: Some("first time".to_string()),
        };
        shift.mark_booked(occupant, Utc::now());
        assert_eq!(shift.status, ShiftStatus::Booked);
        assert!(shift.is_booked_by(" anna "));

        shift.release(Utc::now());
        assert_eq!(shift.status, ShiftStatus::Available);
        assert!(shift.occupant.is_none());
        assert!(!shift.is_booked_by("Anna"));
    }

    #[test]
    fn test_json_shape_uses_hhmm_and_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["startTime"], "18:00");
        assert_eq!(json["endTime"], "22:00");
        assert_eq!(json["date"], "2025-03-07");
        assert_eq!(json["status"], "Available");
        assert!(json.get("occupant").is_none());
    }

    #[test]
    fn test_parse_date_accepts_datetime_values() {
        assert_eq!(
            Shift::parse_date("2025-03-07T18:00:00.000+01:00").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
        );
        assert!(Shift::parse_date("07/03/2025").is_err());
        assert!(Shift::parse_date("").is_err());
    }

    #[test]
    fn test_validate_interval() {
        let nine = Shift::parse_time("09:00").unwrap();
        let ten = Shift::parse_time("10:00").unwrap();
        assert!(Shift::validate_interval(nine, ten).is_ok());
        assert!(Shift::validate_interval(ten, nine).is_err());
        assert!(Shift::validate_interval(nine, nine).is_err());
    }

    #[test]
    fn test_stats_tally() {
        let stats = ShiftStats::tally([
            ShiftStatus::Available,
            ShiftStatus::Booked,
            ShiftStatus::Booked,
            ShiftStatus::Completed,
        ]);
        assert_eq!(
            stats,
            ShiftStats {
                total: 4,
                available: 1,
                booked: 2,
                completed: 1
            }
        );
    }
}
