//! Configuration management for the booking site.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Numeric variables that fail to parse fall back to their default.

use coral_api::ApiConfig;
use coral_runtime::poll::PollPolicy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration that cannot be used to start the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `CORAL_API_BASE_URL` is empty
    #[error("CORAL_API_BASE_URL must not be empty")]
    MissingApiBaseUrl,

    /// `CORAL_API_TIMEOUT_SECS` is zero
    #[error("CORAL_API_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,

    /// `PAYMENT_CONFIRM_ATTEMPTS` is zero
    #[error("PAYMENT_CONFIRM_ATTEMPTS must be greater than zero")]
    ZeroPollAttempts,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote booking API
    pub api: ApiSettings,
    /// HTTP server
    pub server: ServerConfig,
    /// Site branding and URLs
    pub site: SiteConfig,
    /// Card payments
    pub payment: PaymentConfig,
    /// Per-browser persisted state
    pub storage: StorageConfig,
}

/// Remote booking API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL including the version prefix
    pub base_url: String,
    /// Bearer token
    pub token: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Name shown in page titles
    pub name: String,
    /// Public URL of the site, without trailing slash
    pub url: String,
    /// Event whose tickets are sold
    pub event_id: u64,
}

/// Payment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Gateway public key handed to the card widget
    pub public_key: String,
    /// Gateway widget script
    pub script_url: String,
    /// Confirmation probes on the return page
    pub confirm_attempts: u32,
    /// Wait between confirmation probes in milliseconds
    pub confirm_interval_ms: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Redis URL; in-process memory storage when absent
    pub redis_url: Option<String>,
    /// Lifetime of persisted entries after their last write, in seconds
    pub session_ttl_secs: u64,
    /// Idle time after which a session is dropped from memory, in seconds
    pub session_idle_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            api: ApiSettings {
                base_url: text("CORAL_API_BASE_URL", "http://localhost:8000/api/v1"),
                token: text("CORAL_API_TOKEN", ""),
                timeout_secs: parse_or(&lookup, "CORAL_API_TIMEOUT_SECS", 30),
            },
            server: ServerConfig {
                host: text("HOST", "0.0.0.0"),
                port: parse_or(&lookup, "PORT", 3000),
                shutdown_timeout: parse_or(&lookup, "SHUTDOWN_TIMEOUT", 30),
            },
            site: SiteConfig {
                name: text("SITE_NAME", "Coral Island Pattaya"),
                url: text("SITE_URL", "http://localhost:3000")
                    .trim_end_matches('/')
                    .to_string(),
                event_id: parse_or(&lookup, "CORAL_EVENT_ID", 1),
            },
            payment: PaymentConfig {
                public_key: text("OMISE_PUBLIC_KEY", ""),
                script_url: text("OMISE_SCRIPT_URL", "https://cdn.omise.co/omise.js"),
                confirm_attempts: parse_or(&lookup, "PAYMENT_CONFIRM_ATTEMPTS", 5),
                confirm_interval_ms: parse_or(&lookup, "PAYMENT_CONFIRM_INTERVAL_MS", 2000),
            },
            storage: StorageConfig {
                redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
                session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", 604_800), // 7 days
                session_idle_secs: parse_or(&lookup, "SESSION_IDLE_SECS", 3600),
            },
        }
    }

    /// Reject settings the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingApiBaseUrl);
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.payment.confirm_attempts == 0 {
            return Err(ConfigError::ZeroPollAttempts);
        }
        Ok(())
    }

    /// Address the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ApiSettings {
    /// Client settings for [`coral_api::ApiClient`].
    #[must_use]
    pub fn client_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl PaymentConfig {
    /// Polling policy of the payment return page.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.confirm_attempts,
            Duration::from_millis(self.confirm_interval_ms),
        )
    }
}

impl StorageConfig {
    /// Lifetime of persisted entries.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Idle time before in-memory eviction.
    #[must_use]
    pub const fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = key, value = %raw, "Invalid numeric setting, using default");
            default
        }),
        None => default,
    }
}
