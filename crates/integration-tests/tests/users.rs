//! Personal links, preferences and booking history through the HTTP API.

use axum::http::StatusCode;
use serde_json::json;

use shiftdesk_integration_tests::{BASE_URL, TestApp, shift};

async fn register(app: &TestApp, body: serde_json::Value) -> String {
    let (status, json) = app.post("/api/users/generate-link", body).await;
    assert_eq!(status, StatusCode::OK);
    json["data"]["userId"]
        .as_str()
        .expect("user id")
        .to_string()
}

// =============================================================================
// Link Generation
// =============================================================================

#[tokio::test]
async fn test_link_with_only_a_name_disables_every_channel() {
    let app = TestApp::new(Vec::new());
    let (status, json) = app
        .post("/api/users/generate-link", json!({ "name": "Anna" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let user_id = json["data"]["userId"].as_str().expect("user id");
    assert_eq!(
        json["data"]["userLink"],
        format!("{BASE_URL}/user/{user_id}")
    );
    assert_eq!(
        json["data"]["userData"]["preferences"],
        json!({ "enableEmail": false, "enableDiscord": false, "enableCalendar": false })
    );
}

#[tokio::test]
async fn test_link_with_email_enables_email() {
    let app = TestApp::new(Vec::new());
    let user_id = register(&app, json!({ "name": "Anna", "email": "anna@example.org" })).await;

    let (status, json) = app.get(&format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["preferences"]["enableEmail"], true);
    assert_eq!(json["data"]["preferences"]["enableDiscord"], false);
}

#[tokio::test]
async fn test_link_without_name_is_400() {
    let app = TestApp::new(Vec::new());
    let (status, json) = app
        .post("/api/users/generate-link", json!({ "email": "anna@example.org" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_unknown_user_is_404() {
    let app = TestApp::new(Vec::new());
    let (status, _) = app
        .get("/api/users/00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/users/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Preferences
// =============================================================================

#[tokio::test]
async fn test_preferences_are_merged() {
    let app = TestApp::new(Vec::new());
    let user_id = register(&app, json!({ "name": "Anna", "email": "anna@example.org" })).await;

    let (status, json) = app
        .put(
            &format!("/api/users/{user_id}/preferences"),
            json!({ "preferences": { "enableCalendar": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"]["preferences"],
        json!({ "enableEmail": true, "enableDiscord": false, "enableCalendar": true })
    );
}

// =============================================================================
// Booking History
// =============================================================================

#[tokio::test]
async fn test_booking_through_personal_link_is_recorded_and_cancel_removes_it() {
    let app = TestApp::new(vec![shift("a", (2025, 3, 7), "09:00", "12:00")]);
    let user_id = register(&app, json!({ "name": "Anna" })).await;

    let (status, _) = app
        .post(
            "/api/shifts/a/book",
            json!({ "userInfo": { "name": "Anna", "userId": user_id } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = app.get(&format!("/api/users/{user_id}/bookings")).await;
    let bookings = json["data"]["bookings"].as_array().expect("list");
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["shiftId"], "a");
    assert_eq!(bookings[0]["startTime"], "09:00");

    app.delete(
        "/api/shifts/a/book",
        Some(json!({ "userInfo": { "name": "Anna", "userId": user_id } })),
    )
    .await;
    let (_, json) = app.get(&format!("/api/users/{user_id}/bookings")).await;
    assert_eq!(json["data"]["bookings"], json!([]));
}

#[tokio::test]
async fn test_manual_booking_records() {
    let app = TestApp::new(Vec::new());
    let user_id = register(&app, json!({ "name": "Anna" })).await;
    let bookings_uri = format!("/api/users/{user_id}/bookings");

    let (status, json) = app
        .post(
            &bookings_uri,
            json!({ "bookingData": {
                "shiftId": "s-9",
                "title": "Turno Bar",
                "date": "2025-03-07",
                "startTime": "18:00",
                "endTime": "22:00"
            } }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = json["data"]["booking"]["bookingId"]
        .as_str()
        .expect("booking id")
        .to_string();

    let (status, _) = app
        .delete(&format!("{bookings_uri}/{booking_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Removing it again finds nothing
    let (status, _) = app
        .delete(&format!("{bookings_uri}/{booking_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_stats() {
    let app = TestApp::new(Vec::new());
    register(&app, json!({ "name": "Anna", "email": "anna@example.org" })).await;
    register(&app, json!({ "name": "Marco", "discordId": "123456" })).await;

    let (status, json) = app.get("/api/users/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["totalUsers"], 2);
    assert_eq!(json["data"]["usersWithEmail"], 1);
    assert_eq!(json["data"]["usersWithDiscord"], 1);
    assert_eq!(json["data"]["recentlyCreated"], 2);
}
