//! User registry API: personal links, preferences and booking history.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shiftdesk_core::{BookingId, ContactInfo, NotificationPreferences, UserId};
use tracing::{info, instrument};

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::registry::{BookingRecord, PreferencesUpdate, ShiftSnapshot, User, UserStats};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLink {
    pub user_id: UserId,
    pub user_link: String,
    pub user_data: User,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    #[serde(default)]
    pub preferences: PreferencesUpdate,
}

#[derive(Debug, Serialize)]
pub struct Preferences {
    pub preferences: NotificationPreferences,
}

#[derive(Debug, Serialize)]
pub struct Bookings {
    pub bookings: Vec<BookingRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookingRequest {
    pub booking_data: ShiftSnapshot,
}

#[derive(Debug, Serialize)]
pub struct AddedBooking {
    pub booking: BookingRecord,
}

/// Parse a user ID from the path; malformed IDs are simply unknown users.
fn parse_user_id(raw: &str) -> Result<UserId> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("user not found: {raw}")))
}

fn parse_booking_id(raw: &str) -> Result<BookingId> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("booking not found: {raw}")))
}

/// Register a user and return their personal link.
///
/// POST /api/users/generate-link
#[instrument(skip(state, payload))]
pub async fn generate_link(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactInfo>, JsonRejection>,
) -> Result<Json<ApiResponse<GeneratedLink>>> {
    let Json(contact) = payload?;
    let user = state
        .registry()
        .create(&contact.name, contact.email, contact.discord_id)
        .await?;
    info!(user_id = %user.user_id, "Personal link generated");

    Ok(Json(
        ApiResponse::ok(GeneratedLink {
            user_id: user.user_id,
            user_link: state.config().user_link(&user.user_id),
            user_data: user,
        })
        .with_message("Personal link generated"),
    ))
}

/// A user's profile.
///
/// GET /api/users/{user_id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state.registry().get(parse_user_id(&user_id)?).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// Merge notification preferences.
///
/// PUT /api/users/{user_id}/preferences
#[instrument(skip(state, payload))]
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<PreferencesRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Preferences>>> {
    let user_id = parse_user_id(&user_id)?;
    let Json(request) = payload?;
    let preferences = state
        .registry()
        .update_preferences(user_id, request.preferences)
        .await?;

    Ok(Json(
        ApiResponse::ok(Preferences { preferences }).with_message("Preferences updated"),
    ))
}

/// A user's booking history.
///
/// GET /api/users/{user_id}/bookings
#[instrument(skip(state))]
pub async fn bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Bookings>>> {
    let bookings = state.registry().bookings(parse_user_id(&user_id)?).await?;
    Ok(Json(ApiResponse::ok(Bookings { bookings })))
}

/// Record a booking in a user's history.
///
/// POST /api/users/{user_id}/bookings
#[instrument(skip(state, payload))]
pub async fn add_booking(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<AddBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AddedBooking>>)> {
    let user_id = parse_user_id(&user_id)?;
    let Json(request) = payload?;
    let booking = state
        .registry()
        .append_booking(user_id, request.booking_data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AddedBooking { booking }).with_message("Booking recorded")),
    ))
}

/// Remove one record from a user's history.
///
/// DELETE /api/users/{user_id}/bookings/{booking_id}
#[instrument(skip(state))]
pub async fn remove_booking(
    State(state): State<AppState>,
    Path((user_id, booking_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .registry()
        .remove_booking(parse_user_id(&user_id)?, parse_booking_id(&booking_id)?)
        .await?;
    Ok(Json(ApiResponse::ok(()).with_message("Booking removed")))
}

/// Registry counts.
///
/// GET /api/users/stats
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<UserStats>> {
    Json(ApiResponse::ok(state.registry().stats().await))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_ids_are_not_found() {
        assert!(matches!(parse_user_id("nope"), Err(AppError::NotFound(_))));
        assert!(matches!(
            parse_booking_id("123"),
            Err(AppError::NotFound(_))
        ));
        let id = UserId::generate();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_preferences_request_accepts_partial_body() {
        let request: PreferencesRequest =
            serde_json::from_str(r#"{"preferences":{"enableCalendar":true}}"#).unwrap();
        assert_eq!(request.preferences.enable_calendar, Some(true));
        assert_eq!(request.preferences.enable_email, None);
    }
}
