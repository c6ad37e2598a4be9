//! Session cookies and request session resolution

use axum::http::{header, HeaderMap, HeaderValue};

use crate::identity::{IdentityClient, IdentityError, Session, SessionUser};

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

/// Refresh tokens outlive the access token; a week matches the provider default
const REFRESH_TOKEN_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_ACCESS_TOKEN_MAX_AGE_SECS: u64 = 60 * 60;

/// Outcome of resolving a request's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResolution {
    Authenticated(SessionUser),
    Anonymous,
}

/// Resolve the caller of an API request
///
/// Token source: `Authorization: Bearer` first, then the access token cookie.
/// No token means no session and the provider is not called.
pub async fn resolve_session(
    client: &IdentityClient,
    headers: &HeaderMap,
) -> Result<SessionResolution, IdentityError> {
    let Some(token) = access_token(headers) else {
        return Ok(SessionResolution::Anonymous);
    };

    Ok(match client.current_user(&token).await? {
        Some(user) => SessionResolution::Authenticated(user),
        None => SessionResolution::Anonymous,
    })
}

/// Access token carried by a request, if any
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| parse_cookie(headers, ACCESS_TOKEN_COOKIE))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

/// Value of the named cookie across all `Cookie` headers
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` values for a freshly exchanged session
///
/// Tokens are opaque provider strings; a value that cannot be a header is skipped.
pub fn session_cookies(session: &Session, secure: bool) -> Vec<HeaderValue> {
    let mut cookies = Vec::with_capacity(2);

    let access_max_age = session
        .expires_in
        .unwrap_or(DEFAULT_ACCESS_TOKEN_MAX_AGE_SECS);
    cookies.extend(build_cookie(
        ACCESS_TOKEN_COOKIE,
        &session.access_token,
        access_max_age,
        secure,
    ));

    if let Some(refresh_token) = &session.refresh_token {
        cookies.extend(build_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token,
            REFRESH_TOKEN_MAX_AGE_SECS,
            secure,
        ));
    }

    cookies
}

/// Expire the PKCE verifier once it has been spent
pub fn clear_code_verifier_cookie(secure: bool) -> Option<HeaderValue> {
    build_cookie(CODE_VERIFIER_COOKIE, "", 0, secure)
}

fn build_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> Option<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax{}",
        name, value, max_age_secs, secure
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(cookie = name, "Token is not a valid header value, cookie not set");
            None
        }
    }
}
