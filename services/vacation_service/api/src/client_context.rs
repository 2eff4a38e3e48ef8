//! Caller identity as seen at the edge.
//!
//! The client address feeds two consumers with different needs: rate-gate
//! keys (hashed before they ever reach a counter) and audit records (stored
//! as presented). Both read from one [`ClientContext`] resolved per request,
//! so no handler assembles throttling keys from raw header strings.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use shared_rate_limit::KeyGenerator;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone)]
pub struct ClientContext {
    ip_address: Option<IpAddr>,
    user_agent: Option<String>,
}

impl ClientContext {
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            ip_address: client_ip(headers, peer),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        }
    }

    /// Rate-gate key for endpoint classes throttled per client address.
    /// Addresses are hashed by the key generator; counters never see them.
    pub fn rate_key(&self, prefix: &str) -> String {
        KeyGenerator::ip_key(prefix, &self.ip_string())
    }

    fn ip_string(&self) -> String {
        self.ip_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Address for audit records and service calls.
    pub fn ip(&self) -> Option<String> {
        self.ip_address.map(|ip| ip.to_string())
    }

    pub fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|info| info.0);

        Ok(ClientContext::from_request(&parts.headers, peer))
    }
}

/// Best-effort client address behind the reverse proxy.
///
/// Candidates are taken in trust order — X-Forwarded-For entries, then
/// X-Real-IP, then the socket peer — and each must parse as an address.
/// A spoofed or mangled token is skipped, never used as a key verbatim.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let header_values = |name: &'static str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .split(',')
    };

    header_values("x-forwarded-for")
        .chain(header_values("x-real-ip"))
        .filter_map(|candidate| candidate.trim().parse::<IpAddr>().ok())
        .next()
        .or_else(|| peer.map(|addr| addr.ip()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;

    fn peer() -> Option<SocketAddr> {
        Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080))
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );

        assert_eq!(
            client_ip(&headers, peer()),
            Some("203.0.113.1".parse().unwrap())
        );
    }

    #[test]
    fn mangled_forwarded_entries_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("unknown, not-an-ip, 198.51.100.1"),
        );

        assert_eq!(
            client_ip(&headers, None),
            Some("198.51.100.1".parse().unwrap())
        );
    }

    #[test]
    fn real_ip_used_when_forwarded_for_is_useless() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("garbage"));
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.7"));

        assert_eq!(
            client_ip(&headers, peer()),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn forwarded_for_outranks_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));

        assert_eq!(
            client_ip(&headers, peer()),
            Some("203.0.113.1".parse().unwrap())
        );
    }

    #[test]
    fn socket_peer_is_the_last_resort() {
        let headers = HeaderMap::new();
        assert_eq!(
            client_ip(&headers, peer()),
            Some("127.0.0.1".parse().unwrap())
        );
        assert_eq!(client_ip(&headers, None), None);
    }

    #[test]
    fn user_agent_captured_when_present() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
        );

        let context = ClientContext::from_request(&headers, None);
        assert_eq!(
            context.user_agent(),
            Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string())
        );

        let empty = ClientContext::from_request(&HeaderMap::new(), None);
        assert_eq!(empty.user_agent(), None);
    }

    #[test]
    fn rate_keys_are_hashed_and_stable() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));

        let a = ClientContext::from_request(&headers, None);
        let b = ClientContext::from_request(&headers, None);
        let key = a.rate_key("password-reset-confirm");

        assert_eq!(key, b.rate_key("password-reset-confirm"));
        assert!(key.starts_with("password-reset-confirm:"));
        assert!(!key.contains("203.0.113.9"));

        // No address still yields a usable, distinct key.
        let anonymous = ClientContext::from_request(&HeaderMap::new(), None);
        assert_ne!(anonymous.rate_key("password-reset-confirm"), key);
    }
}
