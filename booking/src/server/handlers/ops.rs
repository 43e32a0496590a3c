//! Operational endpoints.
//!
//! - GET /health - Liveness
//! - GET /ready - Readiness (storage backend reachable)
//! - GET /metrics - Prometheus exposition

use crate::server::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coral_web::handlers::{readiness, HealthCheck, HealthReport};

pub use coral_web::handlers::health_check;

/// `GET /ready`
///
/// Unready while the session storage does not answer a ping; degraded (but
/// ready) on process-local storage. The remote API
/// is not probed; pages degrade on their own when it is down.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let storage = state.sessions.storage();
    let check = match storage.ping().await {
        Ok(()) if storage.backend() == "memory" => HealthCheck::degraded(
            "storage:memory",
            "booking drafts are lost when the process restarts",
        ),
        Ok(()) => HealthCheck::healthy(format!("storage:{}", storage.backend())),
        Err(e) => {
            tracing::warn!(backend = storage.backend(), error = %e, "Storage ping failed");
            HealthCheck::unhealthy(format!("storage:{}", storage.backend()), e.to_string())
        },
    };
    readiness(vec![check])
}

/// `GET /metrics`
pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}
