//! Google Calendar authorization callback.
//!
//! The `state` parameter carries the user ID the authorization was started
//! for; every event pending for that user is created once the code is
//! exchanged.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shiftdesk_core::UserId;
use tracing::{info, instrument, warn};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Result page shown in the authorization window.
#[derive(Template, WebTemplate)]
#[template(path = "calendar_callback.html")]
pub struct CallbackTemplate {
    pub success: bool,
    pub message: String,
    pub event_urls: Vec<String>,
}

impl CallbackTemplate {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            event_urls: Vec::new(),
        }
    }
}

/// Finish a Google authorization and create the pending events.
///
/// GET /auth/google/callback
#[instrument(skip(state, params))]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, CallbackTemplate) {
    if let Some(error) = params.error {
        warn!(%error, "Google authorization denied");
        return (
            StatusCode::BAD_REQUEST,
            CallbackTemplate::failed("Authorization was not granted."),
        );
    }

    let (Some(code), Some(user_id)) = (
        params.code,
        params.state.and_then(|s| s.parse::<UserId>().ok()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            CallbackTemplate::failed("The authorization response is incomplete."),
        );
    };

    match state
        .notifiers()
        .calendar
        .complete_authorization(user_id, &code)
        .await
    {
        Ok(event_urls) => {
            info!(user_id = %user_id, events = event_urls.len(), "Calendar events created");
            (
                StatusCode::OK,
                CallbackTemplate {
                    success: true,
                    message: format!("{} shift(s) added to your calendar.", event_urls.len()),
                    event_urls,
                },
            )
        }
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Calendar authorization failed");
            (
                StatusCode::BAD_GATEWAY,
                CallbackTemplate::failed("The calendar could not be updated. Please try booking again."),
            )
        }
    }
}
