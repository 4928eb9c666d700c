//! Token cookie transport.
//!
//! Both tokens travel in `HttpOnly; Secure; SameSite=None` cookies so
//! browser clients on other origins can authenticate; non-browser clients
//! may use `Authorization: Bearer` with the access token instead.

use axum::http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use vidora_core::models::TokenPair;

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Build a Set-Cookie value for a token.
fn build_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={}",
        name, value, max_age_secs
    )
}

/// Build an expired Set-Cookie value that removes the cookie.
fn expire_cookie(name: &str) -> String {
    format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=0",
        name
    )
}

/// Append Set-Cookie headers for a freshly issued token pair.
pub fn set_token_cookies(
    headers: &mut HeaderMap,
    pair: &TokenPair,
    access_max_age: i64,
    refresh_max_age: i64,
) {
    for cookie in [
        build_cookie(ACCESS_COOKIE_NAME, &pair.access_token, access_max_age),
        build_cookie(REFRESH_COOKIE_NAME, &pair.refresh_token, refresh_max_age),
    ] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// Append Set-Cookie headers that clear both token cookies.
pub fn clear_token_cookies(headers: &mut HeaderMap) {
    for cookie in [
        expire_cookie(ACCESS_COOKIE_NAME),
        expire_cookie(REFRESH_COOKIE_NAME),
    ] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// Read a cookie value from the request's Cookie header(s).
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_build_cookie_flags() {
        let cookie = build_cookie(ACCESS_COOKIE_NAME, "tok", 900);
        assert!(cookie.starts_with("access_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn test_get_cookie_parses_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc; refresh_token=def"),
        );
        assert_eq!(
            get_cookie(&headers, ACCESS_COOKIE_NAME),
            Some("abc".to_string())
        );
        assert_eq!(
            get_cookie(&headers, REFRESH_COOKIE_NAME),
            Some("def".to_string())
        );
        assert_eq!(get_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_clear_cookies_expire_both() {
        let mut headers = HeaderMap::new();
        clear_token_cookies(&mut headers);
        let values: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| v.contains("Max-Age=0")));
    }
}
