use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDateTime;
use tower::ServiceExt;

use institute_bookings::config::{AppConfig, SchedulingConfig};
use institute_bookings::db;
use institute_bookings::handlers;
use institute_bookings::models::{Booking, BookingFilter, Slot};
use institute_bookings::services::bookings::BookingService;
use institute_bookings::services::scheduling::fixed_clock;
use institute_bookings::services::store::{BookingStore, ClaimOutcome, SqliteBookingStore};
use institute_bookings::state::AppState;

// ── Mock Store ──

struct FailingStore;

#[async_trait]
impl BookingStore for FailingStore {
    async fn create(&self, _booking: &Booking) -> anyhow::Result<()> {
        anyhow::bail!("store unavailable")
    }
    async fn find_by_id(&self, _id: &str) -> anyhow::Result<Option<Booking>> {
        anyhow::bail!("store unavailable")
    }
    async fn find(&self, _filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
        anyhow::bail!("store unavailable")
    }
    async fn save(&self, _booking: &Booking) -> anyhow::Result<bool> {
        anyhow::bail!("store unavailable")
    }
    async fn claim_slot(
        &self,
        _id: &str,
        _slot: &Slot,
        _now: &NaiveDateTime,
    ) -> anyhow::Result<ClaimOutcome> {
        anyhow::bail!("store unavailable")
    }
    async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
        anyhow::bail!("store unavailable")
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        scheduling: SchedulingConfig::default(),
    }
}

/// "Now" is Sunday 2025-06-15 13:00, so the first bookable day is Monday 2025-06-16.
fn test_now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2025-06-15 13:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

fn state_with_store(store: Arc<dyn BookingStore>) -> Arc<AppState> {
    let config = test_config();
    Arc::new(AppState {
        bookings: BookingService::new(store, config.scheduling.clone(), fixed_clock(test_now())),
        config,
    })
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    state_with_store(Arc::new(SqliteBookingStore::new(Arc::new(Mutex::new(conn)))))
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn create(state: &Arc<AppState>, hrs: f64) -> String {
    let (status, json) = send(
        state,
        json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "by": "learner@example.com",
                "title": "Audit walkthrough",
                "hrs": hrs,
                "type": "individual"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

// ── Create ──

#[tokio::test]
async fn test_create_booking_is_pending() {
    let state = test_state();
    let (status, json) = send(
        &state,
        json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "by": "learner@example.com",
                "title": "Audit walkthrough",
                "hrs": 2,
                "type": "individual",
                "category": "live"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["category"], "live");
    assert_eq!(json["type"], "individual");
    assert!(json["start"].is_null());
    assert!(json["end"].is_null());
    assert!(json["date"].is_null());
}

#[tokio::test]
async fn test_create_missing_field_is_bad_request() {
    let state = test_state();
    let (status, json) = send(
        &state,
        json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({ "by": "learner@example.com", "hrs": 1 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn test_create_with_sub_millisecond_hours_is_bad_request() {
    let state = test_state();
    let (status, json) = send(
        &state,
        json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "by": "learner@example.com",
                "title": "Audit walkthrough",
                "hrs": 1e-7,
                "type": "individual"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "hrs must be a positive number");

    let (_, json) = send(&state, empty_request("GET", "/api/bookings")).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_malformed_body_is_bad_request() {
    let state = test_state();
    let req = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ── Approve / Reject ──

#[tokio::test]
async fn test_approve_assigns_first_slot() {
    let state = test_state();
    let id = create(&state, 2.0).await;

    let (status, json) = send(
        &state,
        empty_request("PATCH", &format!("/api/bookings/{id}/approve")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["booking"]["status"], "booked");
    assert_eq!(json["booking"]["start"], "2025-06-16T10:00:00");
    assert_eq!(json["booking"]["end"], "2025-06-16T12:00:00");
    assert_eq!(json["booking"]["date"], "2025-06-16T00:00:00");
}

#[tokio::test]
async fn test_second_approval_abuts_first() {
    let state = test_state();
    let first = create(&state, 1.0).await;
    let second = create(&state, 1.0).await;

    send(&state, empty_request("PATCH", &format!("/api/bookings/{first}/approve"))).await;
    let (status, json) = send(
        &state,
        empty_request("PATCH", &format!("/api/bookings/{second}/approve")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["start"], "2025-06-16T11:00:00");
    assert_eq!(json["booking"]["end"], "2025-06-16T12:00:00");
}

#[tokio::test]
async fn test_full_day_rolls_over_to_next() {
    let state = test_state();
    let full_day = create(&state, 8.0).await;
    let next = create(&state, 1.0).await;

    let (_, json) = send(
        &state,
        empty_request("PATCH", &format!("/api/bookings/{full_day}/approve")),
    )
    .await;
    assert_eq!(json["booking"]["start"], "2025-06-16T10:00:00");
    assert_eq!(json["booking"]["end"], "2025-06-16T18:00:00");

    let (_, json) = send(
        &state,
        empty_request("PATCH", &format!("/api/bookings/{next}/approve")),
    )
    .await;
    assert_eq!(json["booking"]["start"], "2025-06-17T10:00:00");
    assert_eq!(json["booking"]["end"], "2025-06-17T11:00:00");
}

#[tokio::test]
async fn test_approve_over_window_is_no_capacity() {
    let state = test_state();
    let id = create(&state, 9.0).await;

    let (status, json) = send(
        &state,
        empty_request("PATCH", &format!("/api/bookings/{id}/approve")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No slots available.");
}

#[tokio::test]
async fn test_approve_already_booked_is_rejected_unchanged() {
    let state = test_state();
    let id = create(&state, 1.0).await;
    let (_, first) = send(&state, empty_request("PATCH", &format!("/api/bookings/{id}/approve"))).await;

    let (status, json) = send(
        &state,
        empty_request("PATCH", &format!("/api/bookings/{id}/approve")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Already processed");

    let (_, current) = send(&state, empty_request("GET", &format!("/api/bookings/{id}"))).await;
    assert_eq!(current, first["booking"]);
}

#[tokio::test]
async fn test_approve_unknown_is_not_found() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("PATCH", "/api/bookings/nope/approve")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Booking not found");
}

#[tokio::test]
async fn test_reject_twice_and_unknown() {
    let state = test_state();
    let id = create(&state, 1.0).await;

    for _ in 0..2 {
        let (status, json) = send(
            &state,
            empty_request("PATCH", &format!("/api/bookings/{id}/reject")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["booking"]["status"], "rejected");
    }

    let (status, _) = send(&state, empty_request("PATCH", "/api/bookings/nope/reject")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Listing ──

#[tokio::test]
async fn test_list_filters_and_sorts_by_start() {
    let state = test_state();
    let a = create(&state, 1.0).await;
    let b = create(&state, 1.0).await;
    let c = create(&state, 1.0).await;

    // b is approved first, so it gets the earlier slot.
    send(&state, empty_request("PATCH", &format!("/api/bookings/{b}/approve"))).await;
    send(&state, empty_request("PATCH", &format!("/api/bookings/{a}/approve"))).await;
    send(&state, empty_request("PATCH", &format!("/api/bookings/{c}/reject"))).await;

    let (status, json) = send(&state, empty_request("GET", "/api/bookings?status=booked")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![b.as_str(), a.as_str()]);

    let (_, json) = send(
        &state,
        empty_request("GET", "/api/bookings?by=learner@example.com"),
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (_, json) = send(&state, empty_request("GET", "/api/bookings?by=someone@else.com")).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_unknown_status_is_bad_request() {
    let state = test_state();
    let (status, _) = send(&state, empty_request("GET", "/api/bookings?status=cancelled")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Delete / Calendar ──

#[tokio::test]
async fn test_delete_booking() {
    let state = test_state();
    let id = create(&state, 1.0).await;

    let (status, json) = send(&state, empty_request("DELETE", &format!("/api/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, _) = send(&state, empty_request("GET", &format!("/api/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_download() {
    let state = test_state();
    let id = create(&state, 1.5).await;

    let (status, _) = send(
        &state,
        empty_request("GET", &format!("/api/bookings/{id}/calendar.ics")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&state, empty_request("PATCH", &format!("/api/bookings/{id}/approve"))).await;

    let res = test_app(state)
        .oneshot(empty_request("GET", &format!("/api/bookings/{id}/calendar.ics")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/calendar; charset=utf-8"
    );
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("DTSTART:20250616T100000"));
    assert!(text.contains("DTEND:20250616T113000"));
}

// ── Store Failures ──

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let state = state_with_store(Arc::new(FailingStore));

    let (status, json) = send(&state, empty_request("GET", "/api/bookings")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("store unavailable"));

    let (status, _) = send(&state, empty_request("PATCH", "/api/bookings/x/approve")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(
        &state,
        json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "by": "learner@example.com",
                "title": "Audit walkthrough",
                "hrs": 1,
                "type": "individual"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ── Health Check ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let (status, json) = send(&state, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["window"]["startHour"], 10);
    assert_eq!(json["window"]["endHour"], 18);
    assert_eq!(json["window"]["stepMinutes"], 30);
    assert_eq!(json["window"]["horizonDays"], 90);
}
