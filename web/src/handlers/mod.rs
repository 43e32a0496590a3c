//! HTTP request handlers.
//!
//! Handlers that are not specific to the booking domain.

pub mod health;

// Re-export common handler utilities
pub use health::{health_check, readiness, HealthCheck, HealthReport, HealthStatus};
