//! Client IP resolution middleware
//!
//! Resolves the caller's address once per request and stores it as a
//! [`ClientIp`] request extension. Handlers that consult the policy gate
//! extract it like any other value.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::utils::ip_extraction::{extract_client_ip, UNKNOWN_CLIENT};

/// The resolved client address, or "unknown"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ClientIp>()
            .cloned()
            .unwrap_or_else(|| ClientIp(UNKNOWN_CLIENT.to_string())))
    }
}

/// Resolve the client IP honoring `trusted_proxy_count`
pub async fn client_ip_middleware(
    State(trusted_proxy_count): State<usize>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = extract_client_ip(
        request.headers(),
        socket_addr.as_ref(),
        trusted_proxy_count,
    );

    tracing::trace!(client_ip = %client_ip, "Resolved client address");
    request.extensions_mut().insert(ClientIp(client_ip));
    next.run(request).await
}
