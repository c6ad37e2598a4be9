//! Identity provider client (Supabase GoTrue REST API)
//!
//! Two calls are used:
//! - `POST /auth/v1/token?grant_type=pkce` exchanges a one-time code for a session
//! - `GET /auth/v1/user` returns the user behind an access token

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use soundreal_common::config::SupabaseConfig;
use soundreal_common::Identity;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("soundreal-auth/", env!("CARGO_PKG_VERSION"));

/// Identity provider errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Network error: {0}")]
    Network(String),

    /// Provider refused the request (expired or reused code, bad verifier)
    #[error("Rejected by identity provider ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// The user a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionUser {
    pub fn identity(&self) -> Identity<'_> {
        Identity::new(self.email.as_deref(), Some(self.id.as_str()))
    }
}

/// Session returned by a successful code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: SessionUser,
}

/// Identity provider API client
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl IdentityClient {
    /// `timeout` bounds each call; a slow provider fails the request instead of hanging it
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, IdentityError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Exchange a one-time authorization code for a session
    ///
    /// Single attempt; the caller decides what a failure means.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=pkce", self.base_url);

        tracing::debug!(has_verifier = code_verifier.is_some(), "Exchanging auth code");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({
                "auth_code": code,
                "code_verifier": code_verifier.unwrap_or_default(),
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api(status.as_u16(), error_message(&body)));
        }

        let session: Session = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        tracing::info!(user_id = %session.user.id, "Auth code exchanged");

        Ok(session)
    }

    /// Look up the user behind an access token
    ///
    /// Returns `Ok(None)` when the provider does not accept the token.
    pub async fn current_user(&self, access_token: &str) -> Result<Option<SessionUser>, IdentityError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();

        if status == 401 || status == 403 {
            tracing::debug!(status = status.as_u16(), "Access token not accepted");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api(status.as_u16(), error_message(&body)));
        }

        let user: SessionUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        Ok(Some(user))
    }
}

/// Pull a readable message out of a provider error body
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
