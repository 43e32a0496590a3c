//! Error type for web handlers.
//!
//! [`AppError`] is a status, a machine-readable code and a message safe to
//! show a visitor, plus an optional source that is only logged. JSON
//! endpoints return it directly as `{"code": .., "message": ..}`; HTML pages
//! read the same parts to render an error page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coral_runtime::StoreError;
use serde::Serialize;
use std::fmt;

/// Message used when the real cause must not reach the visitor.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// HTTP-facing error.
///
/// ```ignore
/// async fn selection(session: BrowserSession) -> Result<Json<Snapshot>, AppError> {
///     let snapshot = load(session)
///         .await
///         .map_err(|e| AppError::unavailable("Booking drafts are unavailable").with_source(e))?;
///     Ok(Json(snapshot))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause; it is logged, never rendered.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400: the request itself is malformed.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 404 for a named resource.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} {id} not found"),
        )
    }

    /// 422: well-formed input that fails validation.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    /// 502: the booking API failed or answered nonsense.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", message)
    }

    /// 504: the booking API did not answer in time.
    #[must_use]
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT", message)
    }

    /// 500 with a generic message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", message)
    }

    /// 503: try again shortly.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Message safe to show the visitor.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Log server-side failures. Client errors are expected traffic and stay
    /// quiet.
    pub fn log(&self) {
        if !self.status.is_server_error() {
            return;
        }
        match &self.source {
            Some(source) => tracing::error!(
                status = self.status.as_u16(),
                code = self.code,
                message = %self.message,
                error = %source,
                "Request failed"
            ),
            None => tracing::error!(
                status = self.status.as_u16(),
                code = self.code,
                message = %self.message,
                "Request failed"
            ),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(INTERNAL_MESSAGE).with_source(err)
    }
}

/// A wizard store that is stopping means "come back in a moment".
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::unavailable("The site is restarting, please try again").with_source(err.into())
    }
}
