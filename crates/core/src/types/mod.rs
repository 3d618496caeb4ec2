//! Core types for Shiftdesk.
//!
//! This module provides type-safe wrappers for the booking domain.

pub mod contact;
pub mod email;
pub mod id;
pub mod schedule;
pub mod shift;
pub mod status;

pub use contact::{ContactError, ContactInfo, NotificationPreferences};
pub use email::{Email, EmailError};
pub use id::*;
pub use schedule::{BookingConflict, check_booking_conflict, intervals_overlap};
pub use shift::{Occupant, Shift, ShiftStats, TimeRangeError, hhmm, names_match};
pub use status::*;
