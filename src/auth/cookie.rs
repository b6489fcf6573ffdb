//! Token transport via the `Authorization` cookie.

use axum::http::{HeaderMap, HeaderValue, header, header::InvalidHeaderValue};
use axum::response::Response;

use crate::jwt::{IssuedToken, JwtError};

/// Cookie name carrying the token.
pub const AUTHORIZATION_COOKIE_NAME: &str = "Authorization";

/// Scheme prefix in front of every issued token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Find the token cookie and URL-decode it.
///
/// Returns `None` when no usable value is present. Callers treat that as
/// "no token supplied", which is distinct from an invalid token.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let raw = get_cookie(headers, AUTHORIZATION_COOKIE_NAME)?;
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.trim().is_empty() {
        return None;
    }
    Some(decoded.into_owned())
}

/// Remove the scheme prefix, leaving the encoded token body.
pub fn strip_bearer(raw: &str) -> Result<&str, JwtError> {
    match raw.strip_prefix(BEARER_PREFIX) {
        Some(body) if !body.is_empty() => Ok(body),
        _ => Err(JwtError::Malformed),
    }
}

/// URL-encode a token for use as a cookie value (cookies cannot hold spaces).
pub fn encode_token(token: &str) -> String {
    urlencoding::encode(token).into_owned()
}

/// Build the Set-Cookie value for a token.
pub fn token_cookie(token: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        AUTHORIZATION_COOKIE_NAME,
        encode_token(token),
        max_age,
        secure
    )
}

/// Append the token cookie to an outbound response.
pub fn attach_token(
    response: &mut Response,
    issued: &IssuedToken,
    secure: bool,
) -> Result<(), InvalidHeaderValue> {
    let cookie = token_cookie(&issued.token, issued.duration, secure);
    let value = HeaderValue::from_str(&cookie)?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
