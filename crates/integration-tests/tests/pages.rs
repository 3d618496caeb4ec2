//! Health check, server-rendered pages and the calendar callback.

use axum::http::StatusCode;
use serde_json::json;

use shiftdesk_integration_tests::{TestApp, shift};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(Vec::new());
    let (status, json) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "OK");
    assert!(json["timestamp"].is_string());
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_index_lists_shifts_with_demo_banner() {
    let app = TestApp::new(vec![
        shift("a", (2025, 3, 7), "09:00", "12:00"),
        shift("b", (2025, 3, 8), "18:00", "22:00"),
    ]);

    let (status, html) = app.text("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("demo-banner"));
    assert!(html.contains("data-shift-id=\"a\""));
    assert!(html.contains("data-shift-id=\"b\""));

    let (_, html) = app.text("/?date=2025-03-08").await;
    assert!(!html.contains("data-shift-id=\"a\""));
    assert!(html.contains("data-shift-id=\"b\""));
}

#[tokio::test]
async fn test_user_page_prefills_profile() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    let (_, json) = app
        .post(
            "/api/users/generate-link",
            json!({ "name": "Anna Rossi", "email": "anna@example.org" }),
        )
        .await;
    let user_id = json["data"]["userId"].as_str().expect("user id");

    let (status, html) = app.text(&format!("/user/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Anna Rossi"));
    assert!(html.contains(user_id));

    let (status, html) = app.text("/user/unknown").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("not valid anymore"));
}

#[tokio::test]
async fn test_calendar_callback_without_code_is_400() {
    let app = TestApp::new(Vec::new());
    let (status, html) = app.text("/auth/google/callback?state=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("Calendar not updated"));
}

#[tokio::test]
async fn test_demo_calendar_callback_creates_nothing() {
    let app = TestApp::new(Vec::new());
    let (status, html) = app
        .text("/auth/google/callback?code=abc&state=00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("0 shift(s) added"));
}
