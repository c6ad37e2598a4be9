//! Post-login callback
//!
//! `GET /auth/post-login?code=...` is where the identity provider sends the
//! browser after sign-in. The one-time code is exchanged for a session, the
//! caller's profile is read, and the browser is redirected:
//!
//! - no code, or the exchange fails → `/`
//! - profile grants access → `/dashboard/humanize`
//! - anything else → `/pricing`
//!
//! Every path ends in a redirect; failures are logged, never shown.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::entitlement::{lookup_entitlement, post_login_destination, Destination};
use crate::session::{clear_code_verifier_cookie, parse_cookie, session_cookies, CODE_VERIFIER_COOKIE};
use crate::AppState;

/// GET /auth/post-login
pub async fn post_login(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let secure = state.config.site_is_https();

    let Some(code) = params.get("code").map(|c| c.trim()).filter(|c| !c.is_empty()) else {
        info!("Post-login callback without code");
        return redirect(&state, Destination::Home, Vec::new());
    };

    let verifier = parse_cookie(&headers, CODE_VERIFIER_COOKIE);
    let mut cookies: Vec<HeaderValue> = Vec::new();
    if verifier.is_some() {
        cookies.extend(clear_code_verifier_cookie(secure));
    }

    // One attempt; a rejected or failed exchange is terminal for this request
    let session = match state.identity.exchange_code(code, verifier.as_deref()).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Auth code exchange failed");
            return redirect(&state, Destination::Home, cookies);
        }
    };

    let lookup = lookup_entitlement(&state.store, &session.user.id, state.config.http_timeout).await;
    let destination = post_login_destination(&lookup);

    info!(
        user_id = %session.user.id,
        entitlement = lookup.outcome(),
        destination = destination.path(),
        "Post-login resolved"
    );

    cookies.extend(session_cookies(&session, secure));
    redirect(&state, destination, cookies)
}

fn redirect(state: &AppState, destination: Destination, cookies: Vec<HeaderValue>) -> Response {
    let location = state.config.site_path(destination.path());
    let mut response = Redirect::to(&location).into_response();
    for cookie in cookies {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Build auth callback routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/post-login", get(post_login))
}
