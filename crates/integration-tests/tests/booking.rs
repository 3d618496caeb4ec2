//! Booking, conflict and cancellation behaviour through the HTTP API.

use axum::http::StatusCode;
use serde_json::json;

use shiftdesk_integration_tests::{TestApp, notifiers_with_unready_chat, shift};

fn book_body(name: &str) -> serde_json::Value {
    json!({ "userInfo": { "name": name } })
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_returns_available_in_schedule_order() {
    let app = TestApp::new(vec![
        shift("late", (2025, 3, 8), "09:00", "10:00"),
        shift("evening", (2025, 3, 7), "18:00", "22:00"),
        shift("morning", (2025, 3, 7), "09:00", "12:00"),
    ]);
    app.post("/api/shifts/late/book", book_body("Anna")).await;

    let (status, json) = app.get("/api/shifts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["demo"], true);
    assert_eq!(json["count"], 2);

    let ids: Vec<&str> = json["data"]
        .as_array()
        .expect("data is a list")
        .iter()
        .map(|s| s["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["morning", "evening"]);
    assert!(
        json["data"]
            .as_array()
            .expect("list")
            .iter()
            .all(|s| s["status"] == "Available")
    );
}

#[tokio::test]
async fn test_available_filters_and_stats() {
    let app = TestApp::new(vec![
        shift("a", (2025, 3, 7), "09:00", "12:00"),
        shift("b", (2025, 3, 8), "09:00", "12:00"),
    ]);

    let (status, json) = app.get("/api/shifts/available?date=2025-03-08").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["id"], "b");
    assert_eq!(json["filters"]["date"], "2025-03-08");

    let (status, _) = app.get("/api/shifts/available?date=tomorrow").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.post("/api/shifts/a/book", book_body("Anna")).await;
    let (_, json) = app.get("/api/shifts/stats").await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["available"], 1);
    assert_eq!(json["data"]["booked"], 1);
}

#[tokio::test]
async fn test_get_unknown_shift_is_404() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    let (status, json) = app.get("/api/shifts/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

// =============================================================================
// Booking
// =============================================================================

#[tokio::test]
async fn test_missing_name_is_400_and_nothing_changes() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);

    let (status, json) = app
        .post("/api/shifts/a/book", json!({ "userInfo": { "name": "   " } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (_, json) = app.get("/api/shifts/a").await;
    assert_eq!(json["data"]["status"], "Available");
}

#[tokio::test]
async fn test_invalid_email_is_400() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    let (status, _) = app
        .post(
            "/api/shifts/a/book",
            json!({ "userInfo": { "name": "Anna", "email": "not-an-email" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_booking_of_same_shift_conflicts() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);

    let (status, json) = app.post("/api/shifts/a/book", book_body("Anna")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["shift"]["status"], "Booked");

    let (status, json) = app.post("/api/shifts/a/book", book_body("Marco")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "not available");

    let (_, json) = app.get("/api/shifts/a").await;
    assert_eq!(json["data"]["status"], "Booked");
    assert_eq!(json["data"]["occupant"]["name"], "Anna");
}

#[tokio::test]
async fn test_same_date_is_rejected_regardless_of_time() {
    let app = TestApp::new(vec![
        shift("morning", (2025, 3, 7), "09:00", "10:00"),
        shift("evening", (2025, 3, 7), "20:00", "22:00"),
    ]);

    app.post("/api/shifts/morning/book", book_body("Anna")).await;
    let (status, json) = app.post("/api/shifts/evening/book", book_body(" anna ")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "already has a shift");

    // Someone else can still take it
    let (status, _) = app.post("/api/shifts/evening/book", book_body("Marco")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_overlapping_times_on_other_dates_conflict() {
    let app = TestApp::new(vec![
        shift("first", (2025, 3, 7), "09:00", "10:00"),
        shift("overlap", (2025, 3, 8), "09:30", "10:30"),
        shift("adjacent", (2025, 3, 9), "10:00", "11:00"),
    ]);

    app.post("/api/shifts/first/book", book_body("Anna")).await;

    let (status, json) = app.post("/api/shifts/overlap/book", book_body("Anna")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "time conflict");

    let (status, _) = app.post("/api/shifts/adjacent/book", book_body("Anna")).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_unready_chat_reports_failure_but_booking_succeeds() {
    let app = TestApp::with_notifiers(
        vec![shift("a", (2025, 3, 7), "09:00", "12:00")],
        notifiers_with_unready_chat(),
    );

    let (status, json) = app
        .post(
            "/api/shifts/a/book",
            json!({ "userInfo": { "name": "Anna", "discordId": "123456789" }, "enableDiscord": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["shift"]["status"], "Booked");

    let notifications = json["data"]["notifications"].as_array().expect("list");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "discord");
    assert_eq!(notifications[0]["success"], false);
}

#[tokio::test]
async fn test_demo_channels_simulate_every_notification() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);

    let (status, json) = app
        .post(
            "/api/shifts/a/book",
            json!({
                "userInfo": { "name": "Anna", "email": "anna@example.org" },
                "enableDiscord": true,
                "enableEmail": true,
                "enableCalendar": true
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let notifications = json["data"]["notifications"].as_array().expect("list");
    let types: Vec<&str> = notifications
        .iter()
        .map(|n| n["type"].as_str().expect("type"))
        .collect();
    assert_eq!(types, vec!["discord", "email", "calendar"]);
    assert!(notifications.iter().all(|n| n["success"] == true));
    assert!(
        notifications[2]["eventUrl"]
            .as_str()
            .expect("event url")
            .starts_with("https://calendar.google.com/")
    );
}

#[tokio::test]
async fn test_email_without_address_is_skipped() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    let (_, json) = app
        .post(
            "/api/shifts/a/book",
            json!({ "userInfo": { "name": "Anna" }, "enableEmail": true }),
        )
        .await;
    assert_eq!(json["data"]["notifications"], json!([]));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_book_then_cancel_restores_availability() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    app.post("/api/shifts/a/book", book_body("Anna")).await;

    let (status, json) = app
        .delete("/api/shifts/a/book", Some(json!({ "userInfo": { "name": "ANNA" } })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["shift"]["status"], "Available");
    assert!(json["data"]["shift"].get("occupant").is_none_or(serde_json::Value::is_null));

    let (_, json) = app.get("/api/shifts").await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn test_cancel_by_someone_else_is_403_and_unchanged() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    app.post("/api/shifts/a/book", book_body("Anna")).await;

    let (status, json) = app
        .delete("/api/shifts/a/book", Some(json!({ "userInfo": { "name": "Marco" } })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["success"], false);

    let (_, json) = app.get("/api/shifts/a").await;
    assert_eq!(json["data"]["status"], "Booked");
    assert_eq!(json["data"]["occupant"]["name"], "Anna");
}

#[tokio::test]
async fn test_cancel_unbooked_or_missing_shift() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);

    let (status, _) = app
        .delete("/api/shifts/a/book", Some(book_body("Anna")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete("/api/shifts/missing/book", Some(book_body("Anna")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
