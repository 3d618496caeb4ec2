//! Shiftdesk server library.
//!
//! Volunteer shift booking: a JSON API under `/api`, a server-rendered shift
//! list, and best-effort booking notifications over Discord, email and
//! Google Calendar.
//!
//! Every integration is optional. Without Notion credentials shifts come from
//! an in-memory [`store::DemoStore`]; without a channel's credentials its
//! notifications are simulated.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod registry;
pub mod routes;
pub mod state;
pub mod store;

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/server/static";

/// Build the application router with its request-scoped middleware.
///
/// Tracing, rate limiting and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().base_url);

    routes::routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .with_state(state)
}

/// Allow API calls from the configured public origin only.
fn cors_layer(base_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    match HeaderValue::from_str(base_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "Base URL is not a valid origin, CORS disabled");
            layer
        }
    }
}
