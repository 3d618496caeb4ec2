//! Booking conflict rules.
//!
//! These are pure functions over shift values; both shift stores call
//! [`check_booking_conflict`] with the candidate shift and the shifts the
//! booking person already holds.

use chrono::NaiveTime;
use thiserror::Error;

use super::id::ShiftId;
use super::shift::Shift;
use super::status::ShiftStatus;

/// Why a booking cannot go through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingConflict {
    #[error("shift is not available")]
    NotAvailable,
    #[error("user already has a shift on {date}")]
    SameDay { date: String, existing: ShiftId },
    #[error("time conflict with shift {existing} ({time})")]
    Overlap { existing: ShiftId, time: String },
}

impl BookingConflict {
    /// Short machine-friendly reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotAvailable => "not available",
            Self::SameDay { .. } => "already has a shift",
            Self::Overlap { .. } => "time conflict",
        }
    }
}

/// Half-open overlap of two clock-time intervals.
///
/// `[09:00, 10:00)` and `[10:00, 11:00)` touch but do not overlap.
#[must_use]
pub fn intervals_overlap(
    start_a: NaiveTime,
    end_a: NaiveTime,
    start_b: NaiveTime,
    end_b: NaiveTime,
) -> bool {
    start_a < end_b && start_b < end_a
}

/// Decide whether `candidate` can be booked by someone already holding `held`.
///
/// Rules, in order:
/// 1. the candidate must be `Available`;
/// 2. no held shift may fall on the same date;
/// 3. no held shift may overlap the candidate's clock times, on any date.
///
/// Only `Booked` entries of `held` count; the candidate itself is ignored.
///
/// # Errors
///
/// Returns the first rule that fails.
pub fn check_booking_conflict<'a>(
    candidate: &Shift,
    held: impl IntoIterator<Item = &'a Shift>,
) -> Result<(), BookingConflict> {
    if !candidate.status.is_available() {
        return Err(BookingConflict::NotAvailable);
    }

    let held: Vec<&Shift> = held
        .into_iter()
        .filter(|s| s.status == ShiftStatus::Booked && s.id != candidate.id)
        .collect();

    if let Some(same_day) = held.iter().find(|s| s.date == candidate.date) {
        return Err(BookingConflict::SameDay {
            date: candidate.date.to_string(),
            existing: same_day.id.clone(),
        });
    }

    if let Some(overlapping) = held.iter().find(|s| {
        intervals_overlap(
            candidate.start_time,
            candidate.end_time,
            s.start_time,
            s.end_time,
        )
    }) {
        return Err(BookingConflict::Overlap {
            existing: overlapping.id.clone(),
            time: overlapping.time_label(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::types::shift::Occupant;

    fn t(s: &str) -> NaiveTime {
        Shift::parse_time(s).unwrap()
    }

    fn shift(id: &str, day: u32, start: &str, end: &str, status: ShiftStatus) -> Shift {
        let now = Utc::now();
        Shift {
            id: ShiftId::new(id),
            title: format!("Turno {id}"),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            start_time: t(start),
            end_time: t(end),
            location: "Sala Principale".to_string(),
            status,
            occupant: (status == ShiftStatus::Booked).then(|| Occupant {
                name: "Anna".to_string(),
                email: None,
                discord_id: None,
                notes: None,
            }),
            created_time: now,
            last_edited_time: now,
        }
    }

    #[test]
    fn test_half_open_overlap() {
        assert!(intervals_overlap(t("09:00"), t("10:00"), t("09:30"), t("10:30")));
        assert!(!intervals_overlap(t("09:00"), t("10:00"), t("10:00"), t("11:00")));
        assert!(intervals_overlap(t("09:00"), t("12:00"), t("10:00"), t("11:00")));
    }

    #[test]
    fn test_rejects_unavailable_candidate() {
        let candidate = shift("a", 3, "09:00", "10:00", ShiftStatus::Booked);
        assert_eq!(
            check_booking_conflict(&candidate, std::iter::empty()),
            Err(BookingConflict::NotAvailable)
        );
        let completed = shift("b", 3, "09:00", "10:00", ShiftStatus::Completed);
        assert_eq!(
            check_booking_conflict(&completed, std::iter::empty()).unwrap_err().reason(),
            "not available"
        );
    }

    #[test]
    fn test_same_day_rejected_regardless_of_time() {
        let held = shift("morning", 3, "08:00", "09:00", ShiftStatus::Booked);
        let candidate = shift("evening", 3, "18:00", "22:00", ShiftStatus::Available);
        let err = check_booking_conflict(&candidate, [&held]).unwrap_err();
        assert_eq!(err.reason(), "already has a shift");
    }

    #[test]
    fn test_overlap_on_other_day_rejected() {
        let held = shift("held", 3, "09:00", "10:00", ShiftStatus::Booked);
        let candidate = shift("cand", 4, "09:30", "10:30", ShiftStatus::Available);
        let err = check_booking_conflict(&candidate, [&held]).unwrap_err();
        assert_eq!(err.reason(), "time conflict");
    }

    #[test]
    fn test_adjacent_on_other_day_allowed() {
        let held = shift("held", 3, "09:00", "10:00", ShiftStatus::Booked);
        let candidate = shift("cand", 4, "10:00", "11:00", ShiftStatus::Available);
        assert!(check_booking_conflict(&candidate, [&held]).is_ok());
    }

    #[test]
    fn test_non_booked_held_entries_are_ignored() {
        let done = shift("done", 3, "09:00", "10:00", ShiftStatus::Completed);
        let candidate = shift("cand", 3, "09:00", "10:00", ShiftStatus::Available);
        assert!(check_booking_conflict(&candidate, [&done]).is_ok());
    }
}
