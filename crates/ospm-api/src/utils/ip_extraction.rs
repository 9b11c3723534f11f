//! Client IP address extraction
//!
//! The IP policy gate decides on the address this module resolves, so only
//! the part of an `X-Forwarded-For` chain added by trusted proxies is believed.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Address reported when no valid client IP can be determined.
/// It never matches a whitelist entry.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the address the IP policy gate decides on.
///
/// Proxy headers are only consulted when `trusted_proxy_count > 0`. Falls
/// back to the socket peer, then to [`UNKNOWN_CLIENT`].
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if trusted_proxy_count > 0 {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| extract_from_forwarded_for(value, trusted_proxy_count))
        {
            return ip;
        }

        // X-Real-IP carries a single address set by the nearest proxy
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .and_then(normalize_ip)
        {
            return ip;
        }
    }

    match socket_addr {
        Some(addr) => addr.ip().to_canonical().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

/// Pick the client address out of an `X-Forwarded-For` chain
///
/// The header lists `client, proxy1, proxy2, ...`. Each trusted proxy appends
/// the address it received the request from, so with N trusted proxies the
/// client is the Nth entry from the end. Anything further left was supplied
/// by the client and is ignored.
fn extract_from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if ips.is_empty() {
        return None;
    }

    // A shorter chain than expected: the leftmost entry is the best we have
    let position = ips.len().saturating_sub(trusted_proxy_count);
    normalize_ip(ips[position.min(ips.len() - 1)])
}

/// Parse an address, unwrapping IPv4-mapped IPv6 so whitelists match either form
fn normalize_ip(ip_str: &str) -> Option<String> {
    ip_str
        .parse::<IpAddr>()
        .ok()
        .map(|ip| ip.to_canonical().to_string())
}
