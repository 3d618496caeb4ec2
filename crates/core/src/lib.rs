//! Shiftdesk Core - Shared types library.
//!
//! This crate provides the domain types used across all Shiftdesk components:
//! - `server` - Booking API, notification dispatch and web UI
//! - `cli` - Operator tools for exporting shifts and checking the Notion link
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no HTTP
//! clients. The booking conflict policy lives here so that every shift
//! store applies exactly the same checks.
//!
//! # Modules
//!
//! - [`types`] - Shift records, IDs, contact details, statuses and the
//!   scheduling conflict rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
