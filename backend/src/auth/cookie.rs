//! Session cookie handling
//!
//! The session token travels in an HttpOnly cookie named `jwt`. Logging out
//! overwrites it with an empty value that expires immediately.

use axum::http::{header::COOKIE, HeaderMap};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

/// Cookie name for the session token
pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Build the session cookie carrying a freshly issued token
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build the cookie that clears the session on logout
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Find a non-empty session token in the request's `Cookie` headers
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE_NAME && !c.value().is_empty())
        .map(|c| c.value().to_string())
}
