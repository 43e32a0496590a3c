//! Router configuration for the booking site.
//!
//! Builds the complete Axum router with all endpoints.

use super::handlers::{catalog, checkout, currency, ops, payment, wizard};
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use coral_web::{correlation_id_layer, session_layer, SessionConfig};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Configures all routes including:
/// - Catalog and ticket pages
/// - Booking wizard and its JSON snapshot
/// - Checkout and payment
/// - Currency switcher
/// - Health, readiness and metrics
///
/// Every request passes through the correlation-id middleware (outermost),
/// request tracing and the browser-session cookie middleware.
pub fn build_router(state: AppState) -> Router {
    let session = SessionConfig {
        max_age: state.config.storage.session_ttl(),
        secure: state.config.site.url.starts_with("https://"),
    };

    let pages = Router::new()
        .route("/", get(catalog::index))
        // Catalog
        .route("/tickets", get(catalog::list_tickets))
        .route("/tickets/:slug", get(catalog::ticket_detail))
        .route("/tickets/:slug/book", post(catalog::book_ticket))
        // Wizard
        .route(
            "/booking",
            get(wizard::show_booking).post(wizard::submit_booking),
        )
        .route("/api/booking/selection", get(wizard::selection_json))
        // Checkout
        .route(
            "/checkout",
            get(checkout::show_checkout).post(checkout::submit_checkout),
        )
        // Payment
        .route("/payment/return", get(payment::payment_return))
        .route(
            "/payment/3ds-callback",
            get(payment::three_ds_callback).post(payment::three_ds_callback),
        )
        .route("/payment/:code", get(payment::show_payment))
        .route("/payment/:code/charge", post(payment::charge))
        .route("/booking/confirmation/:code", get(payment::confirmation))
        // Preferences
        .route("/currency", post(currency::set_currency))
        .layer(session_layer(session));

    Router::new()
        // Operational endpoints (no session cookie)
        .route("/health", get(ops::health_check))
        .route("/ready", get(ops::readiness_check))
        .route("/metrics", get(ops::prometheus_metrics))
        .merge(pages)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
