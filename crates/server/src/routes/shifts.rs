//! Shift listing, booking and cancellation.
//!
//! Booking and cancellation change the store first. Notifications run only
//! after the change committed, concurrently and best-effort: their failures
//! are reported in the `notifications` list and never undo the change.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use shiftdesk_core::{ContactInfo, Shift, ShiftId, ShiftStats, UserId};
use tracing::{debug, info, instrument};

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::notify::{
    NotificationOutcome, Notifiers, booking_outcome, calendar_outcome, calendar_removal_outcome,
    cancellation_outcome,
};
use crate::registry::ShiftSnapshot;
use crate::state::AppState;

/// Response for shift lists.
#[derive(Debug, Serialize)]
pub struct ShiftList {
    pub success: bool,
    pub data: Vec<Shift>,
    pub count: usize,
    pub demo: bool,
}

/// Query parameters for `GET /api/shifts/available`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AvailableFilters {
    /// Exact date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Case-insensitive substring of the location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl AvailableFilters {
    /// Apply the filters to a list in schedule order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed date.
    pub fn apply(&self, shifts: Vec<Shift>) -> Result<Vec<Shift>> {
        let date = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(Shift::parse_date)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let location = self
            .location
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());

        let matching = shifts.into_iter().filter(|shift| {
            date.is_none_or(|d| shift.date == d)
                && location
                    .as_deref()
                    .is_none_or(|l| shift.location.to_lowercase().contains(l))
        });

        Ok(match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }
}

/// Response for the filtered available list.
#[derive(Debug, Serialize)]
pub struct FilteredShiftList {
    pub success: bool,
    pub data: Vec<Shift>,
    pub count: usize,
    pub filters: AvailableFilters,
}

/// Body of `POST /api/shifts/{id}/book`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[serde(default)]
    pub user_info: ContactInfo,
    #[serde(default)]
    pub enable_calendar: bool,
    #[serde(default)]
    pub enable_discord: bool,
    #[serde(default)]
    pub enable_email: bool,
}

/// Body of `DELETE /api/shifts/{id}/book`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default)]
    pub user_info: ContactInfo,
    #[serde(default)]
    pub enable_discord: bool,
    #[serde(default)]
    pub enable_email: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booked {
    pub shift: Shift,
    pub user_info: ContactInfo,
    pub notifications: Vec<NotificationOutcome>,
}

#[derive(Debug, Serialize)]
pub struct Cancelled {
    pub shift: Shift,
    pub notifications: Vec<NotificationOutcome>,
}

/// List available shifts.
///
/// GET /api/shifts
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<ShiftList>> {
    let shifts = state.store().list_available().await?;
    Ok(Json(ShiftList {
        success: true,
        count: shifts.len(),
        data: shifts,
        demo: state.store().is_demo(),
    }))
}

/// List available shifts matching optional date, location and limit filters.
///
/// GET /api/shifts/available
#[instrument(skip(state))]
pub async fn available(
    State(state): State<AppState>,
    Query(filters): Query<AvailableFilters>,
) -> Result<Json<FilteredShiftList>> {
    let shifts = filters.apply(state.store().list_available().await?)?;
    Ok(Json(FilteredShiftList {
        success: true,
        count: shifts.len(),
        data: shifts,
        filters,
    }))
}

/// Counts by status.
///
/// GET /api/shifts/stats
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<ShiftStats>>> {
    Ok(Json(ApiResponse::ok(state.store().stats().await?)))
}

/// One shift.
///
/// GET /api/shifts/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Shift>>> {
    Ok(Json(ApiResponse::ok(
        state.store().get(&ShiftId::new(id)).await?,
    )))
}

/// Book a shift and send the requested notifications.
///
/// POST /api/shifts/{id}/book
#[instrument(skip(state, payload))]
pub async fn book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Booked>>> {
    let Json(request) = payload?;
    let contact = request.user_info.clone().validated()?;
    let shift_id = ShiftId::new(id);

    let shift = state.store().book(&shift_id, &contact).await?;
    info!(shift_id = %shift.id, "Shift booked");

    if let Some(user_id) = contact.user_id {
        match state
            .registry()
            .append_booking(user_id, ShiftSnapshot::from(&shift))
            .await
        {
            Ok(record) => debug!(booking_id = %record.booking_id, "Booking recorded"),
            Err(e) => debug!(error = %e, "Booking not recorded in user history"),
        }
    }

    let user_id = contact.user_id.unwrap_or_else(UserId::generate);
    let notifications =
        notify_booking(state.notifiers(), &request, user_id, &shift, &contact).await;

    Ok(Json(
        ApiResponse::ok(Booked {
            shift,
            user_info: contact,
            notifications,
        })
        .with_message("Shift booked successfully"),
    ))
}

/// Cancel a booking held by the requester and send the requested notifications.
///
/// DELETE /api/shifts/{id}/book
#[instrument(skip(state, payload))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Cancelled>>> {
    let Json(request) = payload?;
    let contact = request.user_info.clone().validated()?;
    let shift_id = ShiftId::new(id);

    let shift = state.store().release(&shift_id, &contact.name).await?;
    info!(shift_id = %shift.id, "Booking cancelled");

    if let Some(user_id) = contact.user_id {
        let removed = state
            .registry()
            .remove_shift_bookings(user_id, &shift_id)
            .await;
        debug!(removed, "Booking records removed");
    }

    let notifications = notify_cancellation(state.notifiers(), &request, &shift, &contact).await;

    Ok(Json(
        ApiResponse::ok(Cancelled {
            shift,
            notifications,
        })
        .with_message("Booking cancelled successfully"),
    ))
}

async fn notify_booking(
    notifiers: &Notifiers,
    request: &BookRequest,
    user_id: UserId,
    shift: &Shift,
    contact: &ContactInfo,
) -> Vec<NotificationOutcome> {
    let has_email = contact.email.is_some();

    let chat = async {
        if request.enable_discord {
            Some(booking_outcome(notifiers.chat.as_ref(), shift, contact).await)
        } else {
            None
        }
    };
    let email = async {
        if request.enable_email && has_email {
            Some(booking_outcome(notifiers.email.as_ref(), shift, contact).await)
        } else {
            None
        }
    };
    let calendar = async {
        if request.enable_calendar && has_email {
            Some(calendar_outcome(notifiers.calendar.as_ref(), user_id, shift, contact).await)
        } else {
            None
        }
    };

    let (chat, email, calendar) = tokio::join!(chat, email, calendar);
    [chat, email, calendar].into_iter().flatten().collect()
}

async fn notify_cancellation(
    notifiers: &Notifiers,
    request: &CancelRequest,
    shift: &Shift,
    contact: &ContactInfo,
) -> Vec<NotificationOutcome> {
    let chat = async {
        if request.enable_discord {
            Some(cancellation_outcome(notifiers.chat.as_ref(), shift, contact).await)
        } else {
            None
        }
    };
    let email = async {
        if request.enable_email && contact.email.is_some() {
            Some(cancellation_outcome(notifiers.email.as_ref(), shift, contact).await)
        } else {
            None
        }
    };
    let calendar = calendar_removal_outcome(notifiers.calendar.as_ref(), &shift.id);

    let (chat, email, calendar) = tokio::join!(chat, email, calendar);
    [chat, email, calendar].into_iter().flatten().collect()
}
