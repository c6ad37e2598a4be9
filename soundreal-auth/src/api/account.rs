//! Session-scoped account endpoints
//!
//! Both require a session (bearer token or access token cookie).

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::Serialize;
use soundreal_common::QuotaUsage;

use crate::entitlement::{lookup_entitlement, EntitlementLookup};
use crate::error::{ApiError, ApiResult};
use crate::identity::SessionUser;
use crate::session::{resolve_session, SessionResolution};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AdminCheckResponse {
    pub user_id: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub usage: QuotaUsage,
}

/// GET /api/admin/check
pub async fn admin_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AdminCheckResponse>> {
    let user = require_user(&state, &headers).await?;
    let is_admin = state.config.admins.is_admin(user.identity());

    if is_admin {
        tracing::debug!(user_id = %user.id, "Admin check passed");
    }

    Ok(Json(AdminCheckResponse {
        user_id: user.id,
        is_admin,
    }))
}

/// GET /api/usage
///
/// Unlike the post-login redirect, a missing profile (404) and an
/// unreachable store (503) are reported separately here.
pub async fn usage(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<UsageResponse>> {
    let user = require_user(&state, &headers).await?;

    match lookup_entitlement(&state.store, &user.id, state.config.http_timeout).await {
        EntitlementLookup::Granted(profile) | EntitlementLookup::Denied(profile) => Ok(Json(UsageResponse {
            usage: QuotaUsage::from_profile(&profile),
            user_id: user.id,
        })),
        EntitlementLookup::Missing => Err(ApiError::NotFound(format!("profile for user {}", user.id))),
        EntitlementLookup::Unavailable(reason) => Err(ApiError::Unavailable(reason)),
    }
}

async fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<SessionUser> {
    match resolve_session(&state.identity, headers).await? {
        SessionResolution::Authenticated(user) => Ok(user),
        SessionResolution::Anonymous => Err(ApiError::Unauthorized),
    }
}

/// Build account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/check", get(admin_check))
        .route("/api/usage", get(usage))
}
