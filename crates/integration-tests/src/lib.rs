//! Integration tests for Shiftdesk.
//!
//! Tests drive the full application router in process with
//! `tower::ServiceExt::oneshot`; no network or external service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shiftdesk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `booking` - booking, conflicts, cancellation and notification outcomes
//! - `users` - personal links, preferences and booking history
//! - `pages` - health check and server-rendered pages

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{NaiveDate, Utc};
use secrecy::SecretString;
use serde_json::Value;
use shiftdesk_core::{Shift, ShiftId, ShiftStatus};
use shiftdesk_server::config::{DiscordConfig, ServerConfig};
use shiftdesk_server::notify::{DiscordNotifier, Notifiers};
use shiftdesk_server::state::AppState;
use shiftdesk_server::store::DemoStore;
use tower::ServiceExt;

/// Public URL used by test applications.
pub const BASE_URL: &str = "https://turni.example.org";

/// An available shift on a fixed date.
pub fn shift(id: &str, date: (i32, u32, u32), start: &str, end: &str) -> Shift {
    let now = Utc::now();
    Shift {
        id: ShiftId::new(id),
        title: format!("Turno {id}"),
        description: String::new(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        start_time: Shift::parse_time(start).expect("valid start"),
        end_time: Shift::parse_time(end).expect("valid end"),
        location: "Sala Principale".to_string(),
        status: ShiftStatus::Available,
        occupant: None,
        created_time: now,
        last_edited_time: now,
    }
}

/// Notifiers where chat is live but never initialized, so it is not ready.
pub fn notifiers_with_unready_chat() -> Notifiers {
    let discord = DiscordNotifier::new(&DiscordConfig {
        bot_token: SecretString::from("test-bot-token-never-sent"),
        channel_id: "100200300".to_string(),
    })
    .expect("discord client builds");

    Notifiers {
        chat: Arc::new(discord),
        ..Notifiers::demo()
    }
}

/// An application over a fixed set of shifts.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Demo store over `shifts` with simulated notifications.
    pub fn new(shifts: Vec<Shift>) -> Self {
        Self::with_notifiers(shifts, Notifiers::demo())
    }

    pub fn with_notifiers(shifts: Vec<Shift>, notifiers: Notifiers) -> Self {
        let state = AppState::new(
            ServerConfig::offline(BASE_URL),
            Arc::new(DemoStore::with_shifts(shifts)),
            notifiers,
        );
        Self {
            router: shiftdesk_server::app(state),
        }
    }

    /// Send a request and return the status and the JSON body.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        let json = serde_json::from_slice(&bytes).expect("response body is JSON");
        (status, json)
    }

    /// Send a request and return the status and the body as text.
    pub async fn text(&self, uri: &str) -> (StatusCode, String) {
        let (status, bytes) = self.send(Method::GET, uri, None).await;
        (status, String::from_utf8(bytes).expect("response body is UTF-8"))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.json(Method::DELETE, uri, body).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        (status, bytes.to_vec())
    }
}
