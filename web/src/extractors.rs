//! Request extractors shared by the site's handlers.
//!
//! - [`CorrelationId`]: ID assigned by [`correlation_id_layer`](crate::correlation_id_layer)
//! - [`ClientIp`]: visitor address behind the reverse proxy
//!
//! ```ignore
//! async fn submit_checkout(
//!     ClientIp(ip): ClientIp,
//!     Form(form): Form<CustomerForm>,
//! ) -> PageResult<Response> {
//!     tracing::info!(client_ip = %ip, "Checkout submitted");
//!     // ...
//! }
//! ```

use crate::middleware::incoming_correlation_id;
use axum::{
    async_trait,
    extract::{connect_info::ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

/// Correlation ID of the current request.
///
/// Without the middleware installed the client's `X-Correlation-ID` is used
/// when valid, otherwise a new ID is made up for this extraction only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().copied().unwrap_or_else(|| {
            Self(incoming_correlation_id(&parts.headers).unwrap_or_else(Uuid::new_v4))
        }))
    }
}

/// Visitor IP address.
///
/// The site runs behind a reverse proxy, so the proxy headers win:
/// the first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer
/// (when served with `into_make_service_with_connect_info`), then
/// `127.0.0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(Self(
            proxied_ip(&parts.headers)
                .or(peer)
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ))
    }
}

fn proxied_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    header("X-Forwarded-For")
        .and_then(|hops| hops.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header("X-Real-IP").and_then(|ip| ip.trim().parse().ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn client_ip(request: Request<()>) -> IpAddr {
        let (mut parts, ()) = request.into_parts();
        ClientIp::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn first_forwarded_hop_wins() {
        let request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.1, 10.0.0.2")
            .header("X-Real-IP", "198.51.100.42")
            .body(())
            .unwrap();

        assert_eq!(client_ip(request).await.to_string(), "203.0.113.1");
    }

    #[tokio::test]
    async fn real_ip_used_when_forwarded_for_is_garbage() {
        let request = Request::builder()
            .header("X-Forwarded-For", "unknown")
            .header("X-Real-IP", "198.51.100.42")
            .body(())
            .unwrap();

        assert_eq!(client_ip(request).await.to_string(), "198.51.100.42");
    }

    #[tokio::test]
    async fn socket_peer_then_localhost() {
        let mut request = Request::builder().body(()).unwrap();
        assert_eq!(client_ip(request).await.to_string(), "127.0.0.1");

        request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 51000))));
        assert_eq!(client_ip(request).await.to_string(), "192.0.2.9");
    }

    #[tokio::test]
    async fn correlation_id_prefers_the_middleware_value() {
        let assigned = Uuid::new_v4();
        let mut request = Request::builder()
            .header("X-Correlation-ID", Uuid::new_v4().to_string())
            .body(())
            .unwrap();
        request.extensions_mut().insert(CorrelationId(assigned));

        let (mut parts, ()) = request.into_parts();
        let id = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id.0, assigned);
    }
}
