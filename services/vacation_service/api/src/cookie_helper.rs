//! Refresh-token cookie handling.
//!
//! The refresh token travels only in a secure, httpOnly, SameSite=Strict
//! cookie scoped to the refresh path, so scripts cannot read it and it is
//! not sent on ordinary API calls.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";
/// Covers the refresh and logout endpoints only.
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

fn build_cookie(value: &str, max_age: i64) -> Result<HeaderValue, String> {
    let cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; Secure; SameSite=Strict",
        REFRESH_COOKIE_NAME, value, REFRESH_COOKIE_PATH, max_age
    );
    HeaderValue::from_str(&cookie).map_err(|e| format!("Failed to build cookie: {}", e))
}

/// Set the refresh cookie, expiring with the token itself.
pub fn set_refresh_cookie(
    headers: &mut HeaderMap,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), String> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let cookie = build_cookie(refresh_token, max_age)?;
    headers.append(header::SET_COOKIE, cookie);
    Ok(())
}

/// Clear the refresh cookie (logout).
pub fn clear_refresh_cookie(headers: &mut HeaderMap) -> Result<(), String> {
    let cookie = build_cookie("", 0)?;
    headers.append(header::SET_COOKIE, cookie);
    Ok(())
}

/// Extract the refresh token from the request's Cookie header.
pub fn read_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(REFRESH_COOKIE_NAME) {
            let value = parts.next()?.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_scoped_and_hardened() {
        let mut headers = HeaderMap::new();
        set_refresh_cookie(&mut headers, "tok", Utc::now() + chrono::Duration::days(7)).unwrap();

        let value = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.starts_with("refresh_token=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Path=/api/v1/auth"));
    }

    #[test]
    fn read_cookie_round_trip() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=abc123; lang=en"),
        );
        assert_eq!(read_refresh_cookie(&headers), Some("abc123".to_string()));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(read_refresh_cookie(&empty), None);
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let mut headers = HeaderMap::new();
        clear_refresh_cookie(&mut headers).unwrap();
        let value = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.contains("Max-Age=0"));
    }
}
