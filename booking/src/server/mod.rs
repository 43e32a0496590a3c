//! HTTP server module for the booking site.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Server-rendered pages and their handlers
//! - Health, readiness and metrics endpoints
//! - Router configuration

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod views;

pub use error::{PageError, PageResult};
pub use routes::build_router;
pub use state::AppState;
