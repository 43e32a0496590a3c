//! HTML error responses.
//!
//! Page handlers return [`PageError`], which renders the same status and
//! message as [`AppError`] but as a page a browser can show. JSON endpoints
//! keep using [`AppError`] directly.

use super::views::error_page;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coral_api::ApiError;
use coral_runtime::StoreError;
use coral_web::AppError;

/// Result of a page handler.
pub type PageResult<T> = Result<T, PageError>;

/// An [`AppError`] rendered as HTML.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl PageError {
    /// Underlying error.
    #[must_use]
    pub const fn inner(&self) -> &AppError {
        &self.0
    }
}

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        Self(AppError::from(err))
    }
}

/// Map remote API failures onto the status a visitor should see.
impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        let message = err.user_message();
        let app = match &err {
            ApiError::NotFound { .. } => AppError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "The page you are looking for does not exist.",
            ),
            ApiError::Timeout => AppError::gateway_timeout(message),
            _ => AppError::bad_gateway(message),
        };
        Self(app.with_source(err.into()))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let error = self.0;
        error.log();
        let title = if error.status() == StatusCode::NOT_FOUND {
            "Not found"
        } else if error.status().is_server_error() {
            "Something went wrong"
        } else {
            "Request failed"
        };
        (error.status(), error_page(title, error.message())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_is_404() {
        let error = PageError::from(ApiError::NotFound { message: None });
        assert_eq!(error.inner().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_timeout_is_504() {
        let error = PageError::from(ApiError::Timeout);
        assert_eq!(error.inner().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn other_api_errors_are_502_with_the_server_message() {
        let error = PageError::from(ApiError::Status {
            status: 500,
            message: Some("Ticket sold out".to_string()),
        });
        assert_eq!(error.inner().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.inner().message(), "Ticket sold out");
    }

    #[test]
    fn renders_html() {
        let response = PageError(AppError::not_found("Ticket", "nope")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/html; charset=utf-8")
        );
    }
}
