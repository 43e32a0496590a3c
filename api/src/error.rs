//! Error types for the booking API client

use thiserror::Error;

/// Message shown when the server gave no usable explanation.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when interacting with the booking API
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection reset)
    #[error("Request failed: {0}")]
    Network(String),

    /// No response within the client timeout
    #[error("Request timed out")]
    Timeout,

    /// Unauthorized - invalid or missing bearer token
    #[error("Unauthorized - invalid API token")]
    Unauthorized,

    /// The requested resource does not exist
    #[error("Not found{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    NotFound {
        /// Message from the API, if any
        message: Option<String>,
    },

    /// API returned a non-success status
    #[error("API error (status {status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the API, if any
        message: Option<String>,
    },

    /// API answered 2xx but reported `success: false`
    #[error("Request rejected{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected {
        /// Message from the API, if any
        message: Option<String>,
    },

    /// Response body did not match the expected schema
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The client could not be constructed
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Message suitable for showing to the customer.
    ///
    /// Uses the server-provided message when there is one, otherwise
    /// [`GENERIC_ERROR_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        let server_message = match self {
            Self::NotFound { message } | Self::Status { message, .. } | Self::Rejected { message } => {
                message.as_deref()
            },
            _ => None,
        };

        server_message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string()
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Status { .. } => "status",
            Self::Rejected { .. } => "rejected",
            Self::Malformed(_) => "malformed",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Returns `true` if the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::Rejected {
            message: Some("Time slot is fully booked".to_string()),
        };
        assert_eq!(err.user_message(), "Time slot is fully booked");

        let err = ApiError::Status {
            status: 422,
            message: Some("Email already registered".to_string()),
        };
        assert_eq!(err.user_message(), "Email already registered");
    }

    #[test]
    fn user_message_falls_back_to_generic() {
        assert_eq!(ApiError::Timeout.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(
            ApiError::Status { status: 500, message: Some("  ".to_string()) }.user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            ApiError::Malformed("missing data".to_string()).user_message(),
            GENERIC_ERROR_MESSAGE
        );
    }

    #[test]
    fn display_includes_message() {
        let err = ApiError::Status { status: 503, message: None };
        assert_eq!(err.to_string(), "API error (status 503)");

        let err = ApiError::NotFound { message: Some("Booking not found".to_string()) };
        assert_eq!(err.to_string(), "Not found: Booking not found");
    }
}
