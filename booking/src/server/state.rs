//! Application state for the booking site.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Configuration (site name, payment keys)
//! - Remote booking API client
//! - Per-browser session registry
//! - Checkout and payment services

use crate::checkout::CheckoutService;
use crate::config::Config;
use crate::payment::PaymentService;
use crate::session::{BookingSession, SessionRegistry};
use axum::extract::FromRef;
use coral_api::BookingApi;
use coral_core::environment::Clock;
use coral_web::BrowserSession;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,

    /// Remote booking API
    pub api: Arc<dyn BookingApi>,

    /// Source of "today" for calendar rendering
    pub clock: Arc<dyn Clock>,

    /// In-memory sessions keyed by the session cookie
    pub sessions: Arc<SessionRegistry>,

    /// Customer signup and booking creation
    pub checkout: CheckoutService,

    /// Card charges and payment confirmation
    pub payments: PaymentService,

    /// Prometheus exporter, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create the application state.
    ///
    /// Services are built from `api` and the payment settings in `config`.
    #[must_use]
    pub fn new(
        config: Config,
        api: Arc<dyn BookingApi>,
        clock: Arc<dyn Clock>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        let payments = PaymentService::new(
            Arc::clone(&api),
            config.site.url.clone(),
            config.payment.poll_policy(),
        );
        Self {
            checkout: CheckoutService::new(Arc::clone(&api)),
            payments,
            config: Arc::new(config),
            api,
            clock,
            sessions,
            metrics: None,
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Session of the requesting browser.
    pub async fn session(&self, browser: BrowserSession) -> Arc<BookingSession> {
        self.sessions.session(browser.0).await
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("site", &self.config.site.name)
            .field("sessions", &self.sessions)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}
