//! Shared test helpers: a mock identity provider and app setup
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use soundreal_auth::identity::IdentityClient;
use soundreal_auth::{build_router, AppState};
use soundreal_common::config::{env_keys, CliOverrides, ServiceConfig, TomlConfig};
use soundreal_common::db::ProfileStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SITE_URL: &str = "http://localhost:3000";
pub const ANON_KEY: &str = "test-anon-key";
pub const ADMIN_EMAIL: &str = "owner@soundreal.test";
pub const ADMIN_ID: &str = "u-ops";

/// Codes the mock provider accepts, and whose session they produce
const ACCEPTED_CODES: [(&str, &str, &str); 4] = [
    ("abc123", "u1", "u1@soundreal.test"),
    ("code-u2", "u2", "u2@soundreal.test"),
    ("code-admin", "u-owner", ADMIN_EMAIL),
    ("code-ops", ADMIN_ID, "ops@soundreal.test"),
];

/// Code that makes the mock answer slower than the client timeout
pub const SLOW_CODE: &str = "slow-code";
/// Code that makes the mock answer 500
pub const BROKEN_CODE: &str = "broken-code";

#[derive(Clone, Default)]
struct ProviderLog {
    exchanges: Arc<Mutex<Vec<Value>>>,
}

/// Running mock of the identity provider's REST API
pub struct MockIdentityProvider {
    pub base_url: String,
    log: ProviderLog,
}

impl MockIdentityProvider {
    /// Request bodies of every code exchange seen so far
    pub fn exchanges(&self) -> Vec<Value> {
        self.log.exchanges.lock().unwrap().clone()
    }
}

pub fn token_for(user_id: &str) -> String {
    format!("token-{}", user_id)
}

fn user_for_token(token: &str) -> Option<Value> {
    ACCEPTED_CODES
        .iter()
        .find(|(_, id, _)| token_for(id) == token)
        .map(|(_, id, email)| json!({"id": id, "email": email, "aud": "authenticated"}))
}

fn api_key_ok(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

async fn token_endpoint(
    State(log): State<ProviderLog>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    log.exchanges.lock().unwrap().push(body.clone());

    if !api_key_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "Invalid API key"}))).into_response();
    }
    if params.get("grant_type").map(String::as_str) != Some("pkce") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "unsupported_grant_type"}))).into_response();
    }

    let code = body["auth_code"].as_str().unwrap_or_default();

    if code == SLOW_CODE {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    if code == BROKEN_CODE {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database exploded").into_response();
    }

    match ACCEPTED_CODES.iter().find(|(c, _, _)| *c == code) {
        Some((_, id, email)) => Json(json!({
            "access_token": token_for(id),
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": format!("refresh-{}", id),
            "user": {"id": id, "email": email, "aud": "authenticated"}
        }))
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "invalid flow state, no valid flow state found"
            })),
        )
            .into_response(),
    }
}

async fn user_endpoint(headers: HeaderMap) -> Response {
    if !api_key_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token.and_then(user_for_token) {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"msg": "invalid JWT"}))).into_response(),
    }
}

/// Start the mock provider on an ephemeral port
pub async fn spawn_identity_provider() -> MockIdentityProvider {
    let log = ProviderLog::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token_endpoint))
        .route("/auth/v1/user", get(user_endpoint))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockIdentityProvider {
        base_url: format!("http://{}", addr),
        log,
    }
}

/// URL of a port nothing listens on
pub async fn unreachable_provider_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn test_config(provider_url: &str) -> ServiceConfig {
    let env: HashMap<&str, String> = HashMap::from([
        (env_keys::SITE_URL, SITE_URL.to_string()),
        (env_keys::SUPABASE_URL, provider_url.to_string()),
        (env_keys::SUPABASE_ANON_KEY, ANON_KEY.to_string()),
        (env_keys::DATABASE_URL, "sqlite::memory:".to_string()),
        (env_keys::ADMIN_EMAILS, ADMIN_EMAIL.to_string()),
        (env_keys::ADMIN_IDS, ADMIN_ID.to_string()),
        (env_keys::HTTP_TIMEOUT_SECS, "2".to_string()),
    ]);
    ServiceConfig::resolve(&CliOverrides::default(), |key| env.get(key).cloned(), TomlConfig::default())
        .expect("Test config should be valid")
}

pub async fn test_store() -> ProfileStore {
    let store = ProfileStore::connect("sqlite::memory:", Duration::from_secs(2))
        .await
        .expect("Should open in-memory database");
    store.ensure_profiles_table().await.expect("Should create profiles table");
    store
}

pub async fn insert_profile(store: &ProfileStore, id: &str, has_access: bool, plan: &str) {
    let ProfileStore::Sqlite(pool) = store else {
        panic!("test store should be SQLite");
    };
    sqlx::query("INSERT INTO profiles (id, has_access, plan_type, words_used, transformations_used) VALUES (?, ?, ?, ?, ?)")
        .bind(id)
        .bind(has_access)
        .bind(plan)
        .bind(1_250_i64)
        .bind(3_i64)
        .execute(pool)
        .await
        .expect("Should insert profile");
}

/// Test app wired to the given provider and store
pub fn setup_app(provider_url: &str, store: ProfileStore) -> Router {
    let config = test_config(provider_url);
    let identity = IdentityClient::new(&config.supabase, config.http_timeout).unwrap();
    build_router(AppState::new(config, identity, store))
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_header(uri: &str, name: &str, value: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get("location")
        .expect("Redirect should carry a Location header")
        .to_str()
        .unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub async fn body_json(response: Response) -> Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Should read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
