//! HTTP-level tests for `ApiClient` against a mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use coral_api::{
    ApiClient, ApiConfig, ApiError, BookingApi, BookingStatus, ChargeRequest, Money, SignupRequest,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig::new(format!("{}/api/v1", server.uri()), "secret-token")).unwrap()
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

#[tokio::test]
async fn fetches_tickets_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/events/1/tickets"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/json"))
        .respond_with(ok(json!([{
            "id": 3,
            "title": "Coral Island Day Trip",
            "slug": "day-trip",
            "base_price": "1500.00",
            "min_guest": 1,
            "max_guest": 8,
            "time_slots": [{ "id": 11, "time": "09:00", "adult_price": 1500, "child_price": 750 }]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let tickets = client(&server).tickets(1).await.unwrap();

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].slug, "day-trip");
    assert_eq!(tickets[0].time_slots[0].child_price, Money::from_baht(750));
}

#[tokio::test]
async fn sends_availability_range_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tickets/3/availability"))
        .and(query_param("start_date", "2025-03-01"))
        .and(query_param("end_date", "2025-03-31"))
        .respond_with(ok(json!([
            { "date": "2025-03-01", "active": 1, "ticket_types": [] },
            { "date": "2025-03-02", "active": 0 }
        ])))
        .mount(&server)
        .await;

    let days = client(&server)
        .availability(
            3,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .await
        .unwrap();

    assert!(days[0].is_active());
    assert!(!days[1].is_active());
}

#[tokio::test]
async fn posts_signup_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/customers/signup"))
        .and(body_partial_json(json!({ "email": "jane@example.com", "nationality_id": 66 })))
        .respond_with(ok(json!({ "id": 42, "customer_id": "NDI=" })))
        .mount(&server)
        .await;

    let response = client(&server)
        .signup(&SignupRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            phone: "+66 81 234 5678".into(),
            nationality_id: 66,
        })
        .await
        .unwrap();

    assert_eq!(response.id, 42);
    assert_eq!(response.customer_id.as_deref(), Some("NDI="));
}

#[tokio::test]
async fn maps_not_found_with_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/bookings/NOPE"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Booking not found" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).booking("NOPE").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "Booking not found");
}

#[tokio::test]
async fn maps_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nationalities"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).nationalities().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn server_error_without_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/payments/charge"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .charge(&ChargeRequest {
            booking_code: "CIP-1".into(),
            payment_token: "pt".into(),
            card_token: "tokn_test".into(),
            return_uri: "http://localhost/payment/3ds-callback?booking_code=CIP-1".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 502, message: None }));
    assert_eq!(err.user_message(), coral_api::GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn success_false_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Time slot is fully booked"
        })))
        .mount(&server)
        .await;

    let request: coral_api::CreateBookingRequest = coral_api::CreateBookingRequest {
        event_id: 1,
        ticket_id: 3,
        customer_id: 42,
        booking_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        timeslot_id: 11,
        adults: 2,
        children: 0,
        adult_price: Money::from_baht(500),
        child_price: Money::from_baht(250),
        addons: Vec::new(),
        subtotal: Money::from_baht(1000),
        addon_total: Money::ZERO,
        coupon_discount: Money::ZERO,
        grand_total: Money::from_baht(1000),
        special_request: None,
    };
    let err = client(&server).create_booking(&request).await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(err.user_message(), "Time slot is fully booked");
}

#[tokio::test]
async fn invalid_payload_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/currencies/USD/rate"))
        .respond_with(ok(json!({ "code": "USD", "exchange_rate": -1.0 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/payments/confirm/CIP-1"))
        .respond_with(ok(json!({ "booking_code": "CIP-1", "status": "refunded" })))
        .mount(&server)
        .await;

    let api = client(&server);
    assert!(matches!(api.currency_rate("USD").await, Err(ApiError::Malformed(_))));
    assert!(matches!(api.confirm_payment("CIP-1").await, Err(ApiError::Malformed(_))));
}

#[tokio::test]
async fn confirms_payment_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/payments/confirm/CIP-7"))
        .respond_with(ok(json!({ "booking_code": "CIP-7", "status": "paid" })))
        .mount(&server)
        .await;

    let confirmation = client(&server).confirm_payment("CIP-7").await.unwrap();
    assert_eq!(confirmation.status, BookingStatus::Paid);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/events/1"))
        .respond_with(ok(json!({ "id": 1, "name": "Coral Island" })).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut config = ApiConfig::new(format!("{}/api/v1", server.uri()), "t");
    config.timeout = Duration::from_millis(100);
    let err = ApiClient::new(config).unwrap().event_details(1).await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let api = ApiClient::new(ApiConfig::new("http://127.0.0.1:9/api/v1", "t")).unwrap();
    let err = api.nationalities().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout));
}
