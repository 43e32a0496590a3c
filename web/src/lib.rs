//! Axum web framework integration for the Coral Island booking site.
//!
//! This crate holds the HTTP plumbing shared by the site's handlers,
//! keeping the "Functional Core, Imperative Shell" split: handlers parse
//! requests into actions, dispatch them through a `Store`, and map the
//! result back to a response.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, forms, cookies
//! │  - Request parsing                      │  ← Sessions, correlation IDs
//! │  - Response rendering                   │  ← Logging, metrics
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Pure business logic (reducers)       │
//! │  - State transformations                │
//! │  - Effect descriptions (values)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use coral_web::{correlation_id_layer, session_layer, BrowserSession, SessionConfig};
//!
//! async fn whoami(session: BrowserSession) -> String {
//!     session.to_string()
//! }
//!
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(session_layer(SessionConfig::default()))
//!     .layer(correlation_id_layer());
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod session;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId};
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};
pub use session::{session_layer, BrowserSession, SessionConfig, SESSION_COOKIE};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
