//! Shift storage backends.
//!
//! Two implementations of [`ShiftStore`] exist:
//! - [`NotionStore`] reads and updates pages of a Notion database
//! - [`DemoStore`] keeps generated shifts in memory
//!
//! The backend is picked once at startup from configuration; handlers only
//! see `Arc<dyn ShiftStore>` and the [`ShiftStore::is_demo`] flag.

mod demo;
pub mod notion;

use async_trait::async_trait;
use shiftdesk_core::{BookingConflict, ContactInfo, Shift, ShiftId, ShiftStats};
use thiserror::Error;

pub use demo::DemoStore;
pub use notion::{NotionError, NotionStore};

/// Errors returned by shift stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No shift with this ID exists.
    #[error("shift not found: {0}")]
    NotFound(ShiftId),

    /// The booking was rejected by the conflict rules.
    #[error(transparent)]
    Conflict(#[from] BookingConflict),

    /// A cancellation was requested by someone who does not hold the shift.
    #[error("shift {0} is not booked by this user")]
    NotHeldBy(ShiftId),

    /// The Notion backend failed.
    #[error("Notion error: {0}")]
    Notion(#[from] NotionError),
}

/// Access to shift records and the conflict-checked booking transitions.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Whether this is the in-memory demo backend.
    fn is_demo(&self) -> bool;

    /// Shifts with status `Available`, ordered by date then start time.
    async fn list_available(&self) -> Result<Vec<Shift>, StoreError>;

    /// Every shift regardless of status, ordered by date then start time.
    async fn list_all(&self) -> Result<Vec<Shift>, StoreError>;

    /// Fetch one shift.
    async fn get(&self, id: &ShiftId) -> Result<Shift, StoreError>;

    /// Book `id` for `contact`, applying the conflict rules.
    ///
    /// The contact must already be validated (non-blank name).
    async fn book(&self, id: &ShiftId, contact: &ContactInfo) -> Result<Shift, StoreError>;

    /// Return a shift booked by `name` to `Available`, clearing the occupant.
    async fn release(&self, id: &ShiftId, name: &str) -> Result<Shift, StoreError>;

    /// Counts by status.
    async fn stats(&self) -> Result<ShiftStats, StoreError>;
}

/// Sort shifts into listing order.
pub(crate) fn sort_by_schedule(shifts: &mut [Shift]) {
    shifts.sort_by(|a, b| a.schedule_key().cmp(&b.schedule_key()));
}
