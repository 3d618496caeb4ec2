//! Unified error handling for the HTTP API.
//!
//! Every failure leaves the server as `{"success": false, "error", "message"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use shiftdesk_core::ContactError;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::store::StoreError;

/// Application-level error type for API handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shift store failure (not found, conflict, ownership or upstream).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::NotHeldBy(_)) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Notion(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for the `error` field; the conflict reason for conflicts.
    const fn label(&self) -> &'static str {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) => "Not found",
            Self::Store(StoreError::Conflict(conflict)) => conflict.reason(),
            Self::Store(StoreError::NotHeldBy(_)) => "Forbidden",
            Self::BadRequest(_) => "Bad request",
            Self::Store(StoreError::Notion(_)) => "Internal server error",
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::MissingName => Self::BadRequest(err.to_string()),
            RegistryError::UserNotFound(_) | RegistryError::BookingNotFound(_) => {
                Self::NotFound(err.to_string())
            }
        }
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        // Don't expose upstream error details to clients
        let message = if status.is_server_error() {
            "Something went wrong, please try again later".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "error": self.label(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shiftdesk_core::{BookingConflict, ShiftId, UserId};

    use super::*;
    use crate::store::NotionError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_is_409_with_reason() {
        let conflict = BookingConflict::Overlap {
            existing: ShiftId::new("s-2"),
            time: "09:00 - 10:00".to_string(),
        };
        let (status, json) = body_json(StoreError::Conflict(conflict).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "time conflict");
        assert!(json["message"].as_str().unwrap().contains("s-2"));
    }

    #[test]
    fn test_store_errors_map_to_status() {
        let id = ShiftId::new("s-1");
        assert_eq!(
            AppError::from(StoreError::NotFound(id.clone())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(StoreError::NotHeldBy(id)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_upstream_details_are_hidden() {
        let err = AppError::from(StoreError::Notion(NotionError::Api {
            status: 400,
            code: "validation_error".to_string(),
            message: "secret internals".to_string(),
        }));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!json["message"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn test_registry_and_contact_errors() {
        assert_eq!(
            AppError::from(RegistryError::UserNotFound(UserId::generate())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RegistryError::MissingName).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ContactError::MissingName).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
