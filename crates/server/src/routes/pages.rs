//! Server-rendered shift list.
//!
//! The page lists available shifts with optional date and location filters
//! and carries a booking form per shift. Forms are submitted by
//! `static/app.js` to the JSON API. Opened through `/user/{user_id}` the
//! forms are prefilled from the registry and bookings land in that user's
//! history.

use std::collections::BTreeSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shiftdesk_core::{NotificationPreferences, Shift, ShiftStats, UserId};
use tracing::{instrument, warn};

use super::shifts::AvailableFilters;
use crate::notify::discord::format_date;
use crate::registry::User;
use crate::state::AppState;

/// Filter form values.
#[derive(Debug, Default, Deserialize)]
pub struct PageFilters {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
}

/// One shift as shown on a card.
#[derive(Debug)]
pub struct ShiftCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date_label: String,
    pub time_label: String,
    pub location: String,
}

impl From<&Shift> for ShiftCard {
    fn from(shift: &Shift) -> Self {
        Self {
            id: shift.id.to_string(),
            title: shift.title.clone(),
            description: shift.description.clone(),
            date_label: format_date(shift.date),
            time_label: shift.time_label(),
            location: shift.location.clone(),
        }
    }
}

/// Values prefilled into every booking form.
#[derive(Debug, Default)]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub discord_id: String,
    pub preferences: NotificationPreferences,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            name: user.name.clone(),
            email: user
                .email
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            discord_id: user.discord_id.clone().unwrap_or_default(),
            preferences: user.preferences,
        }
    }
}

/// Shift list page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub demo: bool,
    pub stats: ShiftStats,
    pub shifts: Vec<ShiftCard>,
    pub locations: Vec<String>,
    pub filters: PageFilters,
    pub profile: Option<Profile>,
    pub notice: Option<String>,
}

/// Shift list page.
///
/// GET /
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filters): Query<PageFilters>,
) -> IndexTemplate {
    render(&state, filters, None, None).await
}

/// Shift list page for a registered user.
///
/// GET /user/{user_id}
#[instrument(skip(state))]
pub async fn user_page(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(filters): Query<PageFilters>,
) -> IndexTemplate {
    let user = match user_id.parse::<UserId>() {
        Ok(id) => state.registry().get(id).await.ok(),
        Err(_) => None,
    };
    match user {
        Some(user) => render(&state, filters, Some(Profile::from(&user)), None).await,
        None => {
            render(
                &state,
                filters,
                None,
                Some("This personal link is not valid anymore. Generate a new one below.".to_string()),
            )
            .await
        }
    }
}

async fn render(
    state: &AppState,
    filters: PageFilters,
    profile: Option<Profile>,
    mut notice: Option<String>,
) -> IndexTemplate {
    let store = state.store();

    let available = match store.list_available().await {
        Ok(shifts) => shifts,
        Err(e) => {
            warn!(error = %e, "Shift list unavailable");
            notice = Some("Shifts could not be loaded. Please try again shortly.".to_string());
            Vec::new()
        }
    };
    let stats = store.stats().await.unwrap_or_else(|e| {
        warn!(error = %e, "Shift stats unavailable");
        ShiftStats::default()
    });

    let locations: Vec<String> = available
        .iter()
        .map(|s| s.location.clone())
        .filter(|l| !l.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let query = AvailableFilters {
        date: Some(filters.date.clone()),
        location: Some(filters.location.clone()),
        limit: None,
    };
    let shifts = match query.apply(available.clone()) {
        Ok(shifts) => shifts,
        Err(e) => {
            notice = Some(e.to_string());
            available
        }
    };

    IndexTemplate {
        demo: store.is_demo(),
        stats,
        shifts: shifts.iter().map(ShiftCard::from).collect(),
        locations,
        filters,
        profile,
        notice,
    }
}
