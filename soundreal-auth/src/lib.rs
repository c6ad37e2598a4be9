//! soundreal-auth library - post-login callback and session-scoped API
//!
//! Resolves a caller's session with the identity provider, reads their
//! profile row, and sends them to the right place.

pub mod api;
pub mod entitlement;
pub mod error;
pub mod identity;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use soundreal_common::config::ServiceConfig;
use soundreal_common::db::ProfileStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::identity::IdentityClient;

/// Application state shared across HTTP handlers
///
/// Everything here is read-only once the server starts.
#[derive(Clone)]
pub struct AppState {
    /// Validated configuration, including the admin allow-lists
    pub config: Arc<ServiceConfig>,
    /// Identity provider client
    pub identity: IdentityClient,
    /// Profile store (read-only use)
    pub store: ProfileStore,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig, identity: IdentityClient, store: ProfileStore) -> Self {
        Self {
            config: Arc::new(config),
            identity,
            store,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::auth_routes())
        .merge(api::account_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
