//! Notion-backed shift store.
//!
//! Each page of the configured database is one shift. Reads go through
//! database queries; booking and release are page property updates.
//!
//! The available list is cached for 30 seconds and invalidated by every
//! booking or release made through this process.
//!
//! Booking re-reads the page and the booker's held shifts before the
//! update, but Notion offers no conditional writes: two processes racing on
//! the same page both succeed and the last write wins.

mod client;
pub mod convert;
mod error;
pub mod types;

pub use client::NotionClient;
pub use error::NotionError;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use shiftdesk_core::{
    ContactInfo, Shift, ShiftId, ShiftStats, ShiftStatus, check_booking_conflict,
};
use tracing::{info, instrument, warn};

use self::types::{Page, Sort};
use super::{ShiftStore, StoreError, sort_by_schedule};
use crate::config::NotionConfig;

/// How long the available list is served from memory.
const AVAILABLE_TTL: Duration = Duration::from_secs(30);

/// Shift store backed by a Notion database.
pub struct NotionStore {
    client: NotionClient,
    database_id: String,
    available: Cache<(), Vec<Shift>>,
}

impl std::fmt::Debug for NotionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionStore")
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

impl NotionStore {
    /// Create a store for the configured database.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &NotionConfig) -> Result<Self, NotionError> {
        let available = Cache::builder()
            .max_capacity(1)
            .time_to_live(AVAILABLE_TTL)
            .build();

        Ok(Self {
            client: NotionClient::new(config.token.clone())?,
            database_id: config.database_id.clone(),
            available,
        })
    }

    /// Check that the database is reachable and return its title.
    ///
    /// # Errors
    ///
    /// Returns error if the database is missing or not shared with the
    /// integration.
    pub async fn verify(&self) -> Result<String, NotionError> {
        let database = self.client.retrieve_database(&self.database_id).await?;
        let title = database.title_text();
        info!(database_id = %database.id, title = %title, "Notion database reachable");
        Ok(title)
    }

    async fn query_shifts(
        &self,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<Shift>, NotionError> {
        let pages = self
            .client
            .query(
                &self.database_id,
                filter,
                vec![
                    Sort::ascending(convert::DATE),
                    Sort::ascending(convert::START_TIME),
                ],
            )
            .await?;

        let mut shifts = convert_pages(&pages);
        // Notion sorts rich text lexically; sort again on parsed times.
        sort_by_schedule(&mut shifts);
        Ok(shifts)
    }

    async fn fetch(&self, id: &ShiftId) -> Result<Shift, StoreError> {
        let page = self
            .client
            .retrieve_page(id.as_str())
            .await
            .map_err(|e| not_found_or(e, id))?;
        Ok(convert::page_to_shift(&page)?)
    }
}

#[async_trait]
impl ShiftStore for NotionStore {
    fn is_demo(&self) -> bool {
        false
    }

    #[instrument(skip(self))]
    async fn list_available(&self) -> Result<Vec<Shift>, StoreError> {
        if let Some(cached) = self.available.get(&()).await {
            return Ok(cached);
        }

        let shifts = self
            .query_shifts(Some(convert::status_filter(ShiftStatus::Available)))
            .await?;
        self.available.insert((), shifts.clone()).await;
        Ok(shifts)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Shift>, StoreError> {
        Ok(self.query_shifts(None).await?)
    }

    #[instrument(skip(self), fields(shift_id = %id))]
    async fn get(&self, id: &ShiftId) -> Result<Shift, StoreError> {
        self.fetch(id).await
    }

    #[instrument(skip(self, contact), fields(shift_id = %id))]
    async fn book(&self, id: &ShiftId, contact: &ContactInfo) -> Result<Shift, StoreError> {
        let candidate = self.fetch(id).await?;
        let booked = self
            .query_shifts(Some(convert::status_filter(ShiftStatus::Booked)))
            .await?;
        check_booking_conflict(&candidate, &held_by(booked, &contact.name))?;

        let now = Utc::now();
        let page = self
            .client
            .update_page(
                id.as_str(),
                convert::booking_properties(contact, now.date_naive()),
            )
            .await
            .map_err(|e| not_found_or(e, id))?;
        self.available.invalidate(&()).await;

        info!("Shift booked in Notion");
        Ok(convert::page_to_shift(&page)?)
    }

    #[instrument(skip(self, name), fields(shift_id = %id))]
    async fn release(&self, id: &ShiftId, name: &str) -> Result<Shift, StoreError> {
        let shift = self.fetch(id).await?;
        if !shift.is_booked_by(name) {
            return Err(StoreError::NotHeldBy(id.clone()));
        }

        let page = self
            .client
            .update_page(id.as_str(), convert::release_properties())
            .await
            .map_err(|e| not_found_or(e, id))?;
        self.available.invalidate(&()).await;

        info!("Shift released in Notion");
        Ok(convert::page_to_shift(&page)?)
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> Result<ShiftStats, StoreError> {
        let pages = self
            .client
            .query(&self.database_id, None, Vec::new())
            .await?;
        let counted = ShiftStats::tally(pages.iter().filter_map(convert::page_status));
        // Pages with an unknown status still count toward the total.
        Ok(ShiftStats {
            total: pages.len(),
            ..counted
        })
    }
}

/// Convert pages, skipping any that do not describe a valid shift.
fn convert_pages(pages: &[Page]) -> Vec<Shift> {
    pages
        .iter()
        .filter_map(|page| match convert::page_to_shift(page) {
            Ok(shift) => Some(shift),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable shift page");
                None
            }
        })
        .collect()
}

/// Shifts held by `name`, matched the same way as in `release`.
///
/// Notion's rich text `equals` is case sensitive, so occupants are matched
/// here rather than in the query filter.
fn held_by(booked: Vec<Shift>, name: &str) -> Vec<Shift> {
    booked.into_iter().filter(|s| s.is_booked_by(name)).collect()
}

fn not_found_or(error: NotionError, id: &ShiftId) -> StoreError {
    match error {
        NotionError::NotFound(_) => StoreError::NotFound(id.clone()),
        other => StoreError::Notion(other),
    }
}
