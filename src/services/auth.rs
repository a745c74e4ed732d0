// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side GitHub authentication.
//!
//! The authorization code is exchanged through the OAuth proxy (the client
//! secret never leaves the server). Proxy candidates are tried in configured
//! order, each under the same retry policy.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::SyncError;
use crate::models::{AuthSession, GitHubUser};
use crate::services::gist::GistStore;
use crate::storage::{keys, KeyValueStore};

/// OAuth scope needed to create and update gists.
const OAUTH_SCOPE: &str = "gist";

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Outcome of a failed exchange attempt against one proxy.
enum AttemptError {
    /// The proxy answered and refused; retrying the same code is pointless.
    Rejected(String),
    /// Transport failure or server error; worth another try.
    Retryable(String),
}

/// Auth adapter: code exchange, profile lookup and session persistence.
#[derive(Clone)]
pub struct AuthService {
    http: reqwest::Client,
    kv: Arc<dyn KeyValueStore>,
    gist: GistStore,
    client_id: String,
    oauth_base_url: String,
    backend_urls: Vec<String>,
    retry: RetryPolicy,
}

impl AuthService {
    pub fn new(config: &ClientConfig, kv: Arc<dyn KeyValueStore>, gist: GistStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            kv,
            gist,
            client_id: config.client_id.clone(),
            oauth_base_url: config.oauth_base_url.trim_end_matches('/').to_string(),
            backend_urls: config.backend_urls.clone(),
            retry: config.retry,
        }
    }

    // ─── Login ───────────────────────────────────────────────────

    /// Start a login: persist a fresh state value and return the GitHub
    /// authorize URL to send the user to.
    pub fn begin_login(&self, redirect_uri: &str) -> Result<String, SyncError> {
        let state = generate_state()?;
        self.kv.set(keys::OAUTH_STATE, &state)?;

        Ok(format!(
            "{}/login/oauth/authorize?client_id={}&redirect_uri={}&scope={}&state={}",
            self.oauth_base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            OAUTH_SCOPE,
            state
        ))
    }

    /// Check the state returned by GitHub against the pending one.
    ///
    /// The pending state is consumed whether or not it matches.
    pub fn verify_state(&self, returned: &str) -> Result<(), SyncError> {
        let pending = self.kv.get(keys::OAUTH_STATE)?;
        self.kv.remove(keys::OAUTH_STATE)?;

        match pending {
            Some(expected) if bool::from(expected.as_bytes().ct_eq(returned.as_bytes())) => Ok(()),
            _ => {
                tracing::warn!("OAuth state mismatch");
                Err(SyncError::AuthExchangeFailed(
                    "Security validation error".to_string(),
                ))
            }
        }
    }

    /// Finish a login: verify state, exchange the code, fetch the profile and
    /// persist the session.
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<AuthSession, SyncError> {
        self.verify_state(state)?;

        let token = self.exchange_code(code).await?;
        let user = self.fetch_user(&token).await?;
        let session = AuthSession { token, user };
        self.persist(&session)?;

        tracing::info!(login = %session.user.login, "Logged in to GitHub");
        Ok(session)
    }

    /// Exchange an authorization code for an access token via the proxy.
    pub async fn exchange_code(&self, code: &str) -> Result<String, SyncError> {
        if code.trim().is_empty() {
            return Err(SyncError::AuthExchangeFailed("Missing code".to_string()));
        }

        let mut last_error = String::from("no OAuth backend configured");

        for backend in &self.backend_urls {
            for attempt in 1..=self.retry.attempts {
                match self.try_exchange(backend, code).await {
                    Ok(token) => {
                        tracing::info!(backend = %backend, attempt, "OAuth code exchanged");
                        return Ok(token);
                    }
                    Err(AttemptError::Rejected(msg)) => {
                        tracing::warn!(backend = %backend, error = %msg, "OAuth code rejected");
                        return Err(SyncError::AuthExchangeFailed(msg));
                    }
                    Err(AttemptError::Retryable(msg)) => {
                        tracing::warn!(backend = %backend, attempt, error = %msg, "OAuth exchange attempt failed");
                        last_error = msg;
                        if attempt < self.retry.attempts {
                            tokio::time::sleep(self.retry.backoff).await;
                        }
                    }
                }
            }
        }

        Err(SyncError::AuthExchangeFailed(last_error))
    }

    async fn try_exchange(&self, backend: &str, code: &str) -> Result<String, AttemptError> {
        let url = format!("{}/auth/github/callback", backend.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .json(&ExchangeRequest { code })
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Rejected(format!("HTTP {}: {}", status, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Retryable(format!("HTTP {}: {}", status, body)));
        }

        let body: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Retryable(format!("JSON parse error: {}", e)))?;

        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AttemptError::Rejected("No access token in response".to_string()))
    }

    /// Fetch the profile that owns `token`.
    pub async fn fetch_user(&self, token: &str) -> Result<GitHubUser, SyncError> {
        self.gist
            .client()
            .get_user(token)
            .await
            .map_err(|e| SyncError::AuthExchangeFailed(format!("Failed to fetch user: {}", e)))
    }

    // ─── Session persistence ─────────────────────────────────────

    pub fn persist(&self, session: &AuthSession) -> Result<(), SyncError> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| SyncError::Storage(e.to_string()))?;
        self.kv.set(keys::TOKEN, &session.token)?;
        self.kv.set(keys::USER, &user)?;
        Ok(())
    }

    /// Restore a persisted session. A stored profile that does not parse
    /// clears the session.
    pub fn restore(&self) -> Option<AuthSession> {
        let token = self.kv.get(keys::TOKEN).ok().flatten()?;
        let raw_user = self.kv.get(keys::USER).ok().flatten()?;

        match serde_json::from_str::<GitHubUser>(&raw_user) {
            Ok(user) => {
                tracing::info!(login = %user.login, "Restored GitHub session");
                Some(AuthSession { token, user })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored user profile unreadable, clearing session");
                self.clear();
                None
            }
        }
    }

    /// Drop the persisted session and every cached store handle.
    pub fn logout(&self) {
        self.clear();
        self.gist.invalidate_all();
        tracing::info!("Logged out");
    }

    fn clear(&self) {
        for key in [keys::TOKEN, keys::USER, keys::OAUTH_STATE] {
            if let Err(e) = self.kv.remove(key) {
                tracing::error!(key, error = %e, "Failed to clear session key");
            }
        }
    }
}

/// Random URL-safe OAuth state value.
fn generate_state() -> Result<String, SyncError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| SyncError::Storage("system randomness unavailable".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
