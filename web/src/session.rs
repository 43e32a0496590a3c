//! Browser session cookie.
//!
//! Every visitor gets an opaque session ID in the `coral_session` cookie.
//! The ID keys the visitor's server-side state (booking selection, currency
//! preference); nothing else is stored in the cookie.
//!
//! # Flow
//!
//! 1. **Read** the session ID from the `Cookie` header
//! 2. **Issue** a new UUID v4 when the cookie is missing or malformed
//! 3. **Store** the ID in request extensions as [`BrowserSession`]
//! 4. **Set** the cookie on the response when it was newly issued
//!
//! # Example
//!
//! ```ignore
//! use coral_web::session::{session_layer, BrowserSession, SessionConfig};
//!
//! async fn show_booking(session: BrowserSession) -> String {
//!     format!("session {session}")
//! }
//!
//! let app = Router::new()
//!     .route("/booking", get(show_booking))
//!     .layer(session_layer(SessionConfig::default()));
//! ```

use crate::AppError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::Response,
};
use std::fmt;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "coral_session";

/// Session ID of the current browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrowserSession(pub Uuid);

impl fmt::Display for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| AppError::internal("Session middleware not installed"))
    }
}

/// Cookie attributes for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of the cookie in the browser
    pub max_age: Duration,
    /// Add the `Secure` attribute (HTTPS deployments)
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(7 * 24 * 3600),
            secure: false,
        }
    }
}

impl SessionConfig {
    fn set_cookie_value(&self, session: BrowserSession) -> Option<HeaderValue> {
        let secure = if self.secure { "; Secure" } else { "" };
        let cookie = format!(
            "{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
            self.max_age.as_secs()
        );
        HeaderValue::from_str(&cookie).ok()
    }
}

/// Read the session ID from a `Cookie` header, ignoring malformed values.
#[must_use]
pub fn session_from_headers(headers: &HeaderMap) -> Option<BrowserSession> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(BrowserSession)
}

/// Create a layer that assigns a browser session to every request.
#[must_use]
pub fn session_layer(config: SessionConfig) -> SessionLayer {
    SessionLayer { config }
}

/// Layer for browser session tracking.
#[derive(Clone, Debug)]
pub struct SessionLayer {
    config: SessionConfig,
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Middleware service for browser session tracking.
#[derive(Clone, Debug)]
pub struct SessionMiddleware<S> {
    inner: S,
    config: SessionConfig,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let existing = session_from_headers(req.headers());
        let session = existing.unwrap_or_else(|| BrowserSession(Uuid::new_v4()));
        req.extensions_mut().insert(session);

        let set_cookie = if existing.is_none() {
            tracing::debug!(session_id = %session, "Issued new browser session");
            self.config.set_cookie_value(session)
        } else {
            None
        };

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            if let Some(cookie) = set_cookie {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Ok(response)
        })
    }
}
