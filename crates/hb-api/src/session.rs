//! Request-side identity: who submitted, and which admin (if any) is acting.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use hb_core::{AdminIdentity, SessionCredentials};

use crate::error::ApiError;
use crate::handlers::AppState;

/// Cookie holding the signed admin session token.
pub const ADMIN_TOKEN_COOKIE: &str = "admin_token";

/// Cookie holding the role flag issued by the external identity provider.
pub const EXTERNAL_ROLE_COOKIE: &str = "user_role";

/// Finds `name` across every `Cookie` header of the request.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{ADMIN_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session token.
pub fn cleared_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Pulls the credentials the authenticator chain looks at.
/// The cookie wins over an `Authorization: Bearer` header.
pub fn session_credentials(headers: &HeaderMap) -> SessionCredentials {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    SessionCredentials {
        admin_token: cookie_value(headers, ADMIN_TOKEN_COOKIE)
            .filter(|t| !t.is_empty())
            .or(bearer)
            .map(String::from),
        external_role: cookie_value(headers, EXTERNAL_ROLE_COOKIE).map(String::from),
    }
}

/// Origin metadata stored alongside each confession.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: Option<String>,
}

fn forwarded_for(headers: &HeaderMap, trusted: &[IpAddr]) -> Option<IpAddr> {
    let hops: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect();

    // Right to left: the nearest hop that is not one of our proxies is the client.
    // An unparsable hop ends the walk; anything left of it is unverifiable.
    for hop in hops.into_iter().rev() {
        let ip = hop.parse::<IpAddr>().ok()?;
        if !trusted.contains(&ip) {
            return Some(ip);
        }
    }
    None
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// The submitter's address.
///
/// Forwarding headers only count when the socket peer is a trusted proxy;
/// from anyone else they are ignored and the peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    let resolved = forwarded_for(headers, trusted)
        .or_else(|| real_ip(headers))
        .unwrap_or(peer);
    tracing::trace!(%peer, client = %resolved, "resolved client behind proxy");
    resolved.to_string()
}

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(ClientMeta {
            ip: client_ip(&parts.headers, peer, &state.trusted_proxies),
            user_agent,
        })
    }
}

/// Extractor that only succeeds for a request passing the admin authenticator chain.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminIdentity);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = session_credentials(&parts.headers);
        match state.authenticator.authenticate(&credentials) {
            Ok(identity) => Ok(AdminSession(identity)),
            Err(err) => {
                tracing::warn!(path = %parts.uri.path(), error = %err, "admin access denied");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn finds_cookie_among_many() {
        let h = headers(&[("cookie", "a=1; admin_token=abc ; user_role=confess")]);
        assert_eq!(cookie_value(&h, "admin_token"), Some("abc"));
        assert_eq!(cookie_value(&h, "user_role"), Some("confess"));
        assert_eq!(cookie_value(&h, "missing"), None);
    }

    #[test]
    fn searches_every_cookie_header() {
        let h = headers(&[("cookie", "a=1"), ("cookie", "admin_token=xyz")]);
        assert_eq!(cookie_value(&h, "admin_token"), Some("xyz"));
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let h = headers(&[("authorization", "Bearer tok")]);
        assert_eq!(session_credentials(&h).admin_token.as_deref(), Some("tok"));

        let h = headers(&[("authorization", "Bearer tok"), ("cookie", "admin_token=c")]);
        assert_eq!(session_credentials(&h).admin_token.as_deref(), Some("c"));
    }

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    #[test]
    fn forwarding_headers_from_untrusted_peer_are_ignored() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4"), ("x-real-ip", "5.6.7.8")]);
        assert_eq!(client_ip(&h, Some(ip("203.0.113.7")), &[]), "203.0.113.7");
        assert_eq!(
            client_ip(&h, Some(ip("203.0.113.7")), &[ip("10.0.0.1")]),
            "203.0.113.7"
        );
    }

    #[test]
    fn trusted_proxy_forwards_client_address() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];
        let h = headers(&[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        assert_eq!(client_ip(&h, Some(ip("10.0.0.1")), &trusted), "198.51.100.4");

        // A client-supplied prefix cannot hide the hop our proxy appended.
        let h = headers(&[("x-forwarded-for", "1.1.1.1, 198.51.100.4")]);
        assert_eq!(client_ip(&h, Some(ip("10.0.0.1")), &trusted), "198.51.100.4");

        let h = headers(&[("x-real-ip", "198.51.100.9")]);
        assert_eq!(client_ip(&h, Some(ip("10.0.0.1")), &trusted), "198.51.100.9");

        let h = headers(&[("x-forwarded-for", "garbage")]);
        assert_eq!(client_ip(&h, Some(ip("10.0.0.1")), &trusted), "10.0.0.1");
    }

    #[test]
    fn no_peer_is_unknown() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4")]);
        assert_eq!(client_ip(&h, None, &[ip("1.2.3.4")]), "unknown");
    }

    #[test]
    fn cookie_strings() {
        assert_eq!(
            session_cookie("t", 60, true),
            "admin_token=t; Path=/; HttpOnly; SameSite=Strict; Max-Age=60; Secure"
        );
        assert!(cleared_session_cookie(false).starts_with("admin_token=; "));
        assert!(cleared_session_cookie(false).contains("Max-Age=0"));
    }
}
