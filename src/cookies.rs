use axum::http::{HeaderMap, HeaderValue, header};
use cookie::{Cookie, SameSite};

use crate::{auth::IdentityClaim, config::AppConfig};

/// Client-readable cookie holding the URL-encoded identity claim.
pub const IDENTITY_COOKIE: &str = "user";
/// HTTP-only cookie holding the URL-encoded bearer token.
pub const TOKEN_COOKIE: &str = "access_token";

/// Builds a session cookie with the attributes shared by both cookies.
/// `max_age_days` of zero produces a clearing cookie.
fn session_cookie(
    name: &'static str,
    value: String,
    http_only: bool,
    max_age_days: i64,
    config: &AppConfig,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .http_only(http_only)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::days(max_age_days))
        .secure(config.cookie_secure);

    if let Some(domain) = config.cookie_domain.clone() {
        cookie = cookie.domain(domain);
    }

    cookie.build()
}

fn to_header(cookie: Cookie<'static>) -> Option<HeaderValue> {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(cookie = cookie.name(), error = %err, "cookie is not a valid header value");
            None
        }
    }
}

/// Set-Cookie value for the identity claim. Not HTTP-only: the UI renders from it.
pub fn build_identity_cookie(claim: &IdentityClaim, config: &AppConfig) -> Option<HeaderValue> {
    to_header(session_cookie(
        IDENTITY_COOKIE,
        claim.encode(),
        false,
        config.session_max_age_days,
        config,
    ))
}

/// Set-Cookie value for the bearer token. HTTP-only.
pub fn build_token_cookie(token: &str, config: &AppConfig) -> Option<HeaderValue> {
    to_header(session_cookie(
        TOKEN_COOKIE,
        urlencoding::encode(token).into_owned(),
        true,
        config.session_max_age_days,
        config,
    ))
}

/// Appends both session cookies to a response.
pub fn set_session_cookies(
    headers: &mut HeaderMap,
    token: &str,
    claim: Option<&IdentityClaim>,
    config: &AppConfig,
) {
    if let Some(value) = build_token_cookie(token, config) {
        headers.append(header::SET_COOKIE, value);
    }
    if let Some(value) = claim.and_then(|claim| build_identity_cookie(claim, config)) {
        headers.append(header::SET_COOKIE, value);
    }
}

/// Appends Set-Cookie headers that expire both session cookies.
pub fn clear_session_cookies(headers: &mut HeaderMap, config: &AppConfig) {
    let clearing = [
        session_cookie(IDENTITY_COOKIE, String::new(), false, 0, config),
        session_cookie(TOKEN_COOKIE, String::new(), true, 0, config),
    ];
    for cookie in clearing {
        if let Some(value) = to_header(cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }
}

/// Returns the raw (still URL-encoded) value of a cookie from the `Cookie` headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = header_value.to_str() {
            for piece in cookie_str.split(';') {
                if let Ok(c) = Cookie::parse(piece.trim()) {
                    if c.name() == name {
                        return Some(c.value().to_string());
                    }
                }
            }
        }
    }
    None
}

/// Decoded bearer token, if the token cookie is present and non-empty.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let raw = extract_cookie(headers, TOKEN_COOKIE)?;
    let token = urlencoding::decode(&raw).ok()?.into_owned();
    if token.is_empty() { None } else { Some(token) }
}
