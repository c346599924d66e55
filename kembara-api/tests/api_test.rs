use std::sync::Arc;
use std::time::Duration;
use axum::body::{to_bytes, Body, BodyDataStream};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use kembara_api::{app, AppState};
use kembara_catalog::{Package, PricingEngine, ServiceType};
use kembara_shared::{PackageKind, TimeSlot};
use kembara_store::app_config::PollingConfig;
use kembara_store::InMemoryAvailability;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
}

/// Server date is 2026-11-01, so bookings open on the 2nd
fn fixture() -> (Arc<InMemoryAvailability>, Router) {
    let store = Arc::new(InMemoryAvailability::new());
    store.set_today(day(1));

    store.insert_package(
        Package::new(PackageKind::Tour, "tour-1", ServiceType::Shared, 8500)
            .with_child_price(6000)
            .with_slug("island-hop")
            .with_limits(Some(2), Some(15)),
    );
    store.insert_package(
        Package::new(PackageKind::Tour, "tour-2", ServiceType::Private, 96000)
            .with_slug("private-island-hop")
            .with_limits(None, Some(24)),
    );
    store.insert_package(
        Package::new(PackageKind::Transfer, "tr-1", ServiceType::Shared, 5000)
            .with_child_price(2500)
            .with_slug("airport-shuttle"),
    );

    store.set_slots(PackageKind::Tour, "tour-1", day(2), vec![
        TimeSlot::new("08:00", 10, 10),
        TimeSlot::new("09:00", 10, 0).with_minimum(4).with_current_minimum(4),
    ]);
    store.set_slots(PackageKind::Tour, "tour-2", day(2), vec![TimeSlot::new("10:00", 2, 1)]);
    store.set_slots(PackageKind::Transfer, "tr-1", day(2), vec![TimeSlot::new("07:30", 20, 2).with_minimum(4)]);

    let state = AppState::new(store.clone(), PricingEngine::default(), PollingConfig::default());
    (store, app(state))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (_, app) = fixture();
    let (status, body) = send(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_package_is_404() {
    let (_, app) = fixture();
    let (status, _) = send(app.clone(), "GET", "/v1/packages/tour/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app, "GET", "/v1/packages/cruise/island-hop", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_private_tour_shows_per_seat_price() {
    let (_, app) = fixture();
    let (status, body) = send(app, "GET", "/v1/packages/tour/private-island-hop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_vehicle_booking"], true);
    assert_eq!(body["adult_unit_sen"], 12000);
}

#[tokio::test]
async fn test_slots_default_to_tomorrow() {
    let (_, app) = fixture();
    let (status, body) = send(app, "GET", "/v1/packages/tour/island-hop/slots", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2026-11-02");
    assert_eq!(body["slots"].as_array().unwrap().len(), 2);
    assert_eq!(body["selectable"].as_array().unwrap().len(), 1);
    assert_eq!(body["degraded"], false);
}

#[tokio::test]
async fn test_slot_failure_degrades_to_empty() {
    let (store, app) = fixture();
    store.fail_slots(PackageKind::Tour, "tour-1", day(3));

    let (status, body) = send(app, "GET", "/v1/packages/tour/island-hop/slots?date=2026-11-03", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert!(body["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_next_available_skips_empty_days() {
    let (store, app) = fixture();
    store.set_slots(PackageKind::Tour, "tour-1", day(2), vec![TimeSlot::new("09:00", 10, 10)]);
    store.set_slots(PackageKind::Tour, "tour-1", day(4), vec![TimeSlot::new("09:00", 10, 0)]);

    let (status, body) = send(app, "GET", "/v1/packages/tour/island-hop/next-available", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2026-11-04");
    assert_eq!(body["earliest_date"], "2026-11-02");
}

#[tokio::test]
async fn test_new_draft_auto_selects_and_starts_private_at_eight() {
    let (_, app) = fixture();

    let (status, body) = send(app.clone(), "POST", "/v1/bookings/draft", Some(json!({
        "kind": "tour", "slug": "island-hop"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["date"], "2026-11-02");
    assert_eq!(body["draft"]["time"], "09:00");
    assert_eq!(body["draft"]["party"]["adults"], 0);
    assert_eq!(body["reconciliation"]["type"], "auto_selected");

    let (status, body) = send(app, "POST", "/v1/bookings/draft", Some(json!({
        "kind": "tour", "slug": "private-island-hop"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["party"]["adults"], 8);
    assert_eq!(body["quote"]["total_sen"], 96000);
}

#[tokio::test]
async fn test_draft_before_tomorrow_rejected() {
    let (_, app) = fixture();
    let (status, body) = send(app, "POST", "/v1/bookings/draft", Some(json!({
        "kind": "tour", "slug": "island-hop", "date": "2026-11-01"
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "date_too_early");
}

#[tokio::test]
async fn test_apply_guest_changes() {
    let (_, app) = fixture();
    let draft = json!({
        "package_id": "tour-1", "kind": "tour", "date": "2026-11-02", "time": "09:00",
        "party": { "adults": 7, "children": 3 }
    });

    let (status, body) = send(app.clone(), "POST", "/v1/bookings/draft/apply", Some(json!({
        "kind": "tour", "slug": "island-hop", "draft": draft,
        "action": { "type": "change_adults", "value": 1 }
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "exceeds_capacity");

    let (status, body) = send(app, "POST", "/v1/bookings/draft/apply", Some(json!({
        "kind": "tour", "slug": "island-hop", "draft": draft,
        "action": { "type": "change_children", "value": -1 }
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["party"]["children"], 2);
    assert_eq!(body["quote"]["total_sen"], 7 * 8500 + 2 * 6000);
}

#[tokio::test]
async fn test_select_date_reconciles_time() {
    let (store, app) = fixture();
    store.set_slots(PackageKind::Tour, "tour-1", day(3), vec![TimeSlot::new("14:00", 10, 0)]);

    let (status, body) = send(app, "POST", "/v1/bookings/draft/apply", Some(json!({
        "kind": "tour", "slug": "island-hop",
        "draft": { "package_id": "tour-1", "kind": "tour", "date": "2026-11-02", "time": "09:00",
                   "party": { "adults": 4, "children": 0 } },
        "action": { "type": "select_date", "value": "2026-11-03" }
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["date"], "2026-11-03");
    assert_eq!(body["draft"]["time"], Value::Null);
    assert_eq!(body["reconciliation"]["type"], "cleared");
}

#[tokio::test]
async fn test_continue_first_booking_minimum() {
    let (_, app) = fixture();
    let (status, body) = send(app, "POST", "/v1/bookings/continue", Some(json!({
        "kind": "tour", "slug": "island-hop",
        "draft": { "package_id": "tour-1", "kind": "tour", "date": "2026-11-02", "time": "09:00",
                   "party": { "adults": 2, "children": 1 } }
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "below_minimum");
    assert!(body["error"].as_str().unwrap().starts_with("First booking"));
}

#[tokio::test]
async fn test_continue_minimum_relaxes_after_first_booking() {
    let (store, app) = fixture();
    store.set_slots(PackageKind::Tour, "tour-1", day(2), vec![
        TimeSlot::new("09:00", 10, 4).with_minimum(4).with_current_minimum(1),
    ]);

    let (status, body) = send(app, "POST", "/v1/bookings/continue", Some(json!({
        "kind": "tour", "slug": "island-hop",
        "draft": { "package_id": "tour-1", "kind": "tour", "date": "2026-11-02", "time": "09:00",
                   "party": { "adults": 1, "children": 0 } }
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["units"], 1);
    assert_eq!(body["quote"]["total_sen"], 8500);
}

#[tokio::test]
async fn test_continue_transfer_counts_adults_only() {
    let (_, app) = fixture();
    let (status, body) = send(app, "POST", "/v1/bookings/continue", Some(json!({
        "kind": "transfer", "slug": "airport-shuttle",
        "draft": { "package_id": "tr-1", "kind": "transfer", "date": "2026-11-02", "time": "07:30",
                   "party": { "adults": 3, "children": 5 } }
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "below_minimum");
}

#[tokio::test]
async fn test_continue_private_tour_one_unit() {
    let (_, app) = fixture();
    let (status, body) = send(app, "POST", "/v1/bookings/continue", Some(json!({
        "kind": "tour", "slug": "private-island-hop",
        "draft": { "package_id": "tour-2", "kind": "tour", "date": "2026-11-02", "time": "10:00",
                   "party": { "adults": 8, "children": 0 } }
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_vehicle_booking"], true);
    assert_eq!(body["units"], 1);
    assert_eq!(body["quote"]["total_sen"], 96000);
}

#[tokio::test]
async fn test_continue_rechecks_party_rules() {
    let (_, app) = fixture();
    let (status, body) = send(app.clone(), "POST", "/v1/bookings/continue", Some(json!({
        "kind": "tour", "slug": "private-island-hop",
        "draft": { "package_id": "tour-2", "kind": "tour", "date": "2026-11-02", "time": "10:00",
                   "party": { "adults": 3, "children": 5 } }
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "not_vehicle_multiple");

    let (status, body) = send(app, "POST", "/v1/bookings/continue", Some(json!({
        "kind": "transfer", "slug": "airport-shuttle",
        "draft": { "package_id": "tr-1", "kind": "transfer", "date": "2026-11-02", "time": "07:30",
                   "party": { "adults": 4294967295u32, "children": 1 } }
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "exceeds_maximum");
}

#[tokio::test]
async fn test_cart_review_and_checkout() {
    let (_, app) = fixture();
    let items = json!([
        { "_id": "ok", "packageId": "tour-1", "packageType": "tour", "selectedDate": "2026-11-02",
          "selectedTime": "09:00", "adults": 4, "children": 0, "totalPrice": 340.0 },
        { "_id": "full", "packageId": "tour-1", "packageType": "tour",
          "bookingDate": "2026-11-02T00:00:00.000Z", "timeSlot": "08:00", "guests": 2, "totalPrice": 170.0 }
    ]);

    let (status, body) = send(app.clone(), "POST", "/v1/cart/review", Some(json!({ "items": items }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["status"], "valid");
    assert_eq!(body["items"][1]["status"], "invalid");
    assert_eq!(body["subtotal_sen"], 34000);
    assert_eq!(body["tax_sen"], 952);
    assert_eq!(body["total_sen"], 34952);

    let (status, body) = send(app.clone(), "POST", "/v1/cart/checkout", Some(json!({ "items": items }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_items_present");
    assert_eq!(body["details"]["invalid_ids"], json!(["full"]));

    let (status, body) = send(app, "POST", "/v1/cart/checkout", Some(json!({ "items": [items[0].clone()] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["total_sen"], 34952);
}

#[tokio::test]
async fn test_empty_cart_checkout() {
    let (_, app) = fixture();
    let (status, body) = send(app, "POST", "/v1/cart/checkout", Some(json!({ "items": [] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "empty_cart");
}

/// JSON payload of the next SSE event on the stream
async fn next_event(stream: &mut BodyDataStream) -> Value {
    let mut buffer = String::new();
    loop {
        let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("stream timed out")
            .expect("stream ended")
            .unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        while let Some(end) = buffer.find("\n\n") {
            let event: String = buffer.drain(..end + 2).collect();
            if let Some(data) = event.lines().find_map(|line| line.strip_prefix("data:")) {
                return serde_json::from_str(data.trim()).unwrap();
            }
        }
    }
}

#[tokio::test]
async fn test_stream_can_be_moved_and_closed() {
    let (store, app) = fixture();
    store.set_slots(PackageKind::Tour, "tour-1", day(3), vec![TimeSlot::new("15:00", 10, 0)]);

    let request = Request::builder()
        .uri("/v1/packages/tour/island-hop/slots/stream?date=2026-11-02&selected=09:00")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut stream = response.into_body().into_data_stream();

    let first = next_event(&mut stream).await;
    assert_eq!(first["snapshot"]["date"], "2026-11-02");
    assert_eq!(first["selected"], "09:00");
    let watch_id = first["snapshot"]["watch_id"].as_str().unwrap().to_string();

    let (status, _) = send(app.clone(), "POST", &format!("/v1/streams/{}/date", watch_id),
        Some(json!({ "date": "2026-11-01" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(app.clone(), "POST", &format!("/v1/streams/{}/date", watch_id),
        Some(json!({ "date": "2026-11-03" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2026-11-03");

    let moved = next_event(&mut stream).await;
    assert_eq!(moved["snapshot"]["date"], "2026-11-03");
    assert_eq!(moved["selected"], "15:00");

    let (status, _) = send(app.clone(), "DELETE", &format!("/v1/streams/{}", watch_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app, "DELETE", &format!("/v1/streams/{}", watch_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_stream_is_404() {
    let (_, app) = fixture();
    let (status, _) = send(app, "POST", "/v1/streams/3f2b6c1e-8a4d-4d7e-9b1a-2c5e6f7a8b9c/date",
        Some(json!({ "date": "2026-11-03" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
