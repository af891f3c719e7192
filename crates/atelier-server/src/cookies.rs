//! Minimal cookie reading and writing.
//!
//! Two cookies exist: the OAuth anti-forgery state (short-lived) and the
//! admin session token. Both are HttpOnly; nothing here needs a full cookie
//! jar implementation.

use axum::http::HeaderMap;

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "atelier_session";

/// Name of the OAuth state cookie.
pub const STATE_COOKIE: &str = "atelier_oauth_state";

/// Lifetime of the OAuth state cookie, in seconds.
const STATE_MAX_AGE_SECS: u32 = 600;

/// Extract a cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        if key == name {
            return parts.next().map(|v| v.trim().to_string());
        }
    }
    None
}

/// `Set-Cookie` value for the session cookie.
pub fn session_cookie(token: &str, ttl_hours: u32) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=Lax",
        SESSION_COOKIE,
        token,
        u64::from(ttl_hours) * 3600
    )
}

/// `Set-Cookie` value for the OAuth state cookie.
pub fn state_cookie(state: &str) -> String {
    format!(
        "{}={}; Path=/auth; Max-Age={}; HttpOnly; Secure; SameSite=Lax",
        STATE_COOKIE, state, STATE_MAX_AGE_SECS
    )
}

/// `Set-Cookie` value that removes a cookie.
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=Lax", name)
}
