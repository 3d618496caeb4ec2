//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                                   - Shift list page
//! GET    /user/{user_id}                     - Shift list page with a personal profile
//! GET    /auth/google/callback               - Google Calendar authorization callback
//! GET    /health                             - Health check
//!
//! # Shifts
//! GET    /api/shifts                         - Available shifts
//! GET    /api/shifts/available               - Available shifts, filtered
//! GET    /api/shifts/stats                   - Counts by status
//! GET    /api/shifts/{id}                    - One shift
//! POST   /api/shifts/{id}/book               - Book a shift
//! DELETE /api/shifts/{id}/book               - Cancel a booking
//!
//! # Users
//! POST   /api/users/generate-link            - Register a user, return a personal link
//! GET    /api/users/stats                    - Registry counts
//! GET    /api/users/{user_id}                - Profile
//! PUT    /api/users/{user_id}/preferences    - Merge notification preferences
//! GET    /api/users/{user_id}/bookings       - Booking history
//! POST   /api/users/{user_id}/bookings       - Record a booking
//! DELETE /api/users/{user_id}/bookings/{id}  - Remove a booking record
//! ```

pub mod calendar;
pub mod health;
pub mod pages;
pub mod shifts;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;

/// Successful API response: `{"success": true, "data": ..., "message"?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Create the shift API router.
pub fn shift_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shifts::list))
        .route("/available", get(shifts::available))
        .route("/stats", get(shifts::stats))
        .route("/{id}", get(shifts::show))
        .route("/{id}/book", post(shifts::book).delete(shifts::cancel))
}

/// Create the user API router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-link", post(users::generate_link))
        .route("/stats", get(users::stats))
        .route("/{user_id}", get(users::show))
        .route(
            "/{user_id}/preferences",
            axum::routing::put(users::update_preferences),
        )
        .route(
            "/{user_id}/bookings",
            get(users::bookings).post(users::add_booking),
        )
        .route(
            "/{user_id}/bookings/{booking_id}",
            axum::routing::delete(users::remove_booking),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/user/{user_id}", get(pages::user_page))
        .route("/auth/google/callback", get(calendar::callback))
        .route("/health", get(health::health))
        .nest("/api/shifts", shift_routes())
        .nest("/api/users", user_routes())
}
