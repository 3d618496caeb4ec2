//! Google Calendar invites through OAuth2.
//!
//! Booking a shift with calendar enabled returns an authorization URL and
//! parks the shift under the user's ID. When Google redirects back with a
//! code, the code is exchanged for an access token and every parked shift
//! becomes an event on the user's primary calendar. Event IDs are kept per
//! shift so a cancellation can delete the event. Cancelling before the
//! user authorizes drops the parked shift instead.
//!
//! Parked shifts expire after an hour without activity. Tokens live only in
//! memory and are never refreshed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use moka::future::Cache;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use shiftdesk_core::{ContactInfo, Shift, ShiftId, UserId};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use url::Url;

use super::{CalendarLink, CalendarScheduler, DEFAULT_LOCATION, NotifyError};
use crate::config::GoogleConfig;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const SCOPES: &str =
    "https://www.googleapis.com/auth/calendar https://www.googleapis.com/auth/calendar.events";

/// How long parked shifts wait for the user to authorize.
const PENDING_IDLE: Duration = Duration::from_secs(60 * 60);

/// Most users with parked shifts at once.
const MAX_PENDING_USERS: u64 = 10_000;

/// Errors that can occur when talking to Google.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// HTTP request failed.
    #[error("Google request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Google returned an error response.
    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The authorization URL could not be built.
    #[error("Invalid authorization URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An authorization arrived for a user with nothing to schedule.
    #[error("no pending calendar events for user {0}")]
    NothingPending(UserId),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    #[serde(default)]
    html_link: String,
}

struct PendingEvent {
    shift: Shift,
    contact: ContactInfo,
}

struct CreatedEvent {
    event_id: String,
    access_token: SecretString,
}

/// Live calendar backed by the Google Calendar v3 API.
pub struct GoogleCalendar {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    time_zone: String,
    base_url: String,
    pending: Cache<UserId, Arc<Mutex<Vec<PendingEvent>>>>,
    events: Mutex<HashMap<ShiftId, CreatedEvent>>,
}

impl std::fmt::Debug for GoogleCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendar")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("time_zone", &self.time_zone)
            .finish_non_exhaustive()
    }
}

impl GoogleCalendar {
    /// Create a calendar client for the configured OAuth application.
    #[must_use]
    pub fn new(config: &GoogleConfig, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            time_zone: config.time_zone.clone(),
            base_url: base_url.to_string(),
            pending: Cache::builder()
                .max_capacity(MAX_PENDING_USERS)
                .time_to_idle(PENDING_IDLE)
                .build(),
            events: Mutex::new(HashMap::new()),
        }
    }

    /// Consent screen URL; `state` carries the user ID back to the callback.
    ///
    /// # Errors
    ///
    /// Returns error if the URL cannot be assembled.
    pub fn authorization_url(&self, user: UserId) -> Result<String, CalendarError> {
        let state = user.to_string();
        let url = Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state.as_str()),
            ],
        )?;
        Ok(url.into())
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<SecretString, CalendarError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let token: TokenResponse = handle_response(response).await?;
        Ok(SecretString::from(token.access_token))
    }

    #[instrument(skip(self, access_token, pending), fields(shift_id = %pending.shift.id))]
    async fn insert_event(
        &self,
        access_token: &SecretString,
        pending: &PendingEvent,
    ) -> Result<EventResponse, CalendarError> {
        let body = event_body(
            &pending.shift,
            &pending.contact,
            &self.time_zone,
            &self.base_url,
        );
        let response = self
            .client
            .post(EVENTS_URL)
            .query(&[("sendUpdates", "all")])
            .bearer_auth(access_token.expose_secret())
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Forget a shift still waiting for authorization.
    async fn drop_parked(&self, shift: &ShiftId) {
        let parked: Vec<_> = self.pending.iter().collect();
        for (user, list) in parked {
            let mut events = list.lock().await;
            let before = events.len();
            events.retain(|p| p.shift.id != *shift);
            if events.len() == before {
                continue;
            }
            info!(shift_id = %shift, user_id = %user, "Parked calendar event dropped");
            if events.is_empty() {
                drop(events);
                self.pending.invalidate(&*user).await;
            }
        }
    }

    #[instrument(skip(self, event))]
    async fn delete_event(&self, event: &CreatedEvent) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(format!("{EVENTS_URL}/{}", event.event_id))
            .query(&[("sendUpdates", "all")])
            .bearer_auth(event.access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        // Already gone counts as deleted.
        if status.is_success()
            || status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::GONE
        {
            return Ok(());
        }
        Err(api_error(response).await)
    }
}

#[async_trait]
impl CalendarScheduler for GoogleCalendar {
    fn is_ready(&self) -> bool {
        true
    }

    async fn schedule(
        &self,
        user: UserId,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<CalendarLink, NotifyError> {
        let url = self.authorization_url(user)?;
        let parked = self.pending.get_with(user, async { Arc::default() }).await;
        parked.lock().await.push(PendingEvent {
            shift: shift.clone(),
            contact: contact.clone(),
        });
        Ok(CalendarLink::AuthorizationRequired(url))
    }

    async fn complete_authorization(
        &self,
        user: UserId,
        code: &str,
    ) -> Result<Vec<String>, NotifyError> {
        let pending = match self.pending.remove(&user).await {
            Some(parked) => std::mem::take(&mut *parked.lock().await),
            None => Vec::new(),
        };
        if pending.is_empty() {
            return Err(CalendarError::NothingPending(user).into());
        }

        let access_token = self.exchange_code(code).await?;
        let mut links = Vec::with_capacity(pending.len());

        for item in &pending {
            match self.insert_event(&access_token, item).await {
                Ok(event) => {
                    info!(event_id = %event.id, shift_id = %item.shift.id, "Calendar event created");
                    self.events.lock().await.insert(
                        item.shift.id.clone(),
                        CreatedEvent {
                            event_id: event.id,
                            access_token: access_token.clone(),
                        },
                    );
                    links.push(event.html_link);
                }
                Err(e) => {
                    warn!(error = %e, shift_id = %item.shift.id, "Calendar event creation failed");
                }
            }
        }

        Ok(links)
    }

    async fn unschedule(&self, shift: &ShiftId) -> Result<bool, NotifyError> {
        self.drop_parked(shift).await;

        let Some(event) = self.events.lock().await.remove(shift) else {
            return Ok(false);
        };
        self.delete_event(&event).await?;
        info!(event_id = %event.event_id, shift_id = %shift, "Calendar event deleted");
        Ok(true)
    }
}

/// Request body for a new event.
fn event_body(shift: &Shift, contact: &ContactInfo, time_zone: &str, base_url: &str) -> Value {
    let location = if shift.location.is_empty() {
        DEFAULT_LOCATION
    } else {
        shift.location.as_str()
    };
    let attendees: Vec<Value> = contact
        .email
        .iter()
        .map(|email| {
            json!({
                "email": email.as_str(),
                "displayName": contact.name,
                "responseStatus": "accepted",
            })
        })
        .collect();

    json!({
        "summary": format!("Bar shift - {}", shift.title),
        "description": event_description(shift, contact, base_url),
        "start": {
            "dateTime": local_datetime(shift.date.and_time(shift.start_time)),
            "timeZone": time_zone,
        },
        "end": {
            "dateTime": local_datetime(shift.date.and_time(shift.end_time)),
            "timeZone": time_zone,
        },
        "location": location,
        "attendees": attendees,
        "reminders": {
            "useDefault": false,
            "overrides": [
                { "method": "email", "minutes": 60 },
                { "method": "popup", "minutes": 30 },
            ],
        },
        "source": { "title": "Shiftdesk", "url": base_url },
    })
}

fn event_description(shift: &Shift, contact: &ContactInfo, base_url: &str) -> String {
    let mut description = String::from("Volunteer shift at the association\n\n");
    if !shift.description.is_empty() {
        description.push_str(&format!("Description: {}\n\n", shift.description));
    }
    description.push_str(&format!("Booked by: {}\n", contact.name));
    if let Some(notes) = &contact.notes {
        description.push_str(&format!("Notes: {notes}\n\n"));
    }
    description.push_str(&format!("Link: {base_url}"));
    description
}

fn local_datetime(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CalendarError> {
    if response.status().is_success() {
        return Ok(response.json().await?);
    }
    Err(api_error(response).await)
}

async fn api_error(response: reqwest::Response) -> CalendarError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    CalendarError::Api { status, message }
}
