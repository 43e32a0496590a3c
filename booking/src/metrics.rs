//! Business metrics for the booking site.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `coral_wizard_actions_total{action}` - Wizard actions handled, refused ones included
//! - `coral_bookings_created_total` - Bookings created at checkout
//! - `coral_checkout_failures_total{reason}` - Checkouts stopped by validation or the API
//! - `coral_payments_total{outcome}` - Payment confirmations by outcome
//! - `coral_api_requests_total{endpoint,outcome}` - Remote API calls
//!
//! ## Gauges
//! - `coral_sessions_active` - Browser sessions held in memory
//!
//! ## Histograms
//! - `coral_api_request_duration_seconds{endpoint}` - Remote API latency

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Register descriptions of all business metrics.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "coral_wizard_actions_total",
        "Booking wizard actions handled, by action"
    );

    describe_counter!(
        "coral_bookings_created_total",
        "Bookings created at checkout"
    );
    describe_counter!(
        "coral_checkout_failures_total",
        "Checkouts that did not create a booking, by reason"
    );

    describe_counter!(
        "coral_payments_total",
        "Payment confirmations by outcome (paid, failed, still_processing)"
    );

    describe_counter!(
        "coral_api_requests_total",
        "Requests to the booking API by endpoint and outcome"
    );
    describe_histogram!(
        "coral_api_request_duration_seconds",
        Unit::Seconds,
        "Latency of booking API requests"
    );

    describe_gauge!(
        "coral_sessions_active",
        "Browser sessions currently held in memory"
    );

    tracing::info!("Business metrics registered");
}
