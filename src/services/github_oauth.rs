// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side GitHub OAuth token exchange (holds the client secret).

use crate::config::Config;
use crate::error::AppError;
use serde::Deserialize;

/// GitHub's token endpoint answers 200 even for a bad code, with an
/// `error` field instead of a token.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct GitHubOAuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl GitHubOAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: format!(
                "{}/login/oauth/access_token",
                config.github_oauth_url.trim_end_matches('/')
            ),
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
        }
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
            }))
            .send()
            .await
            .map_err(|e| AppError::GitHubApi(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GitHubApi(format!("HTTP {}: {}", status, body)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::GitHubApi(format!("JSON parse error: {}", e)))?;

        if let Some(error) = body.error {
            return Err(AppError::OAuthRejected(body.error_description.unwrap_or(error)));
        }

        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::GitHubApi("No access token in response".to_string()))
    }
}
