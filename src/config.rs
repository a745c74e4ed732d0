// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration loaded from environment variables.
//!
//! `Config` drives the OAuth proxy binary; `ClientConfig` drives the
//! library side (GitHub API location, backend candidates, retry policy).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// OAuth proxy configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub OAuth app client ID (public)
    pub github_client_id: String,
    /// GitHub OAuth app client secret
    pub github_client_secret: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Base URL of GitHub's OAuth endpoints
    pub github_oauth_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            github_client_id: env::var("GITHUB_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GITHUB_CLIENT_ID"))?,
            github_client_secret: env::var("GITHUB_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GITHUB_CLIENT_SECRET"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5500".to_string()),
            github_oauth_url: env::var("GITHUB_OAUTH_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_OAUTH_URL.to_string()),
            port: parse_or("PORT", 3001)?,
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            github_client_id: "test_client_id".to_string(),
            github_client_secret: "test_secret".to_string(),
            frontend_url: "http://localhost:5500".to_string(),
            github_oauth_url: DEFAULT_GITHUB_OAUTH_URL.to_string(),
            port: 3001,
        }
    }
}

const DEFAULT_GITHUB_OAUTH_URL: &str = "https://github.com";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// How often to retry a single backend candidate before moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per candidate, at least 1
    pub attempts: u32,
    /// Fixed delay between attempts against the same candidate
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Client-side configuration for the sync library.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitHub REST API base URL
    pub api_base_url: String,
    /// GitHub OAuth base URL (for building the authorize URL)
    pub oauth_base_url: String,
    /// GitHub OAuth app client ID
    pub client_id: String,
    /// OAuth proxy base URLs, tried in order
    pub backend_urls: Vec<String>,
    pub retry: RetryPolicy,
    /// Page size used when scanning the user's gists
    pub gist_page_size: u32,
    /// File backing the local key/value store
    pub state_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_GITHUB_API_URL.to_string(),
            oauth_base_url: DEFAULT_GITHUB_OAUTH_URL.to_string(),
            client_id: String::new(),
            backend_urls: vec!["http://localhost:3001".to_string()],
            retry: RetryPolicy::default(),
            gist_page_size: 100,
            state_path: PathBuf::from("yearprogress-state.json"),
        }
    }
}

impl ClientConfig {
    /// Load client configuration from environment variables.
    ///
    /// Everything has a default except the OAuth client ID.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let backend_urls = match env::var("YEARPROGRESS_BACKEND_URLS") {
            Ok(raw) => parse_url_list(&raw),
            Err(_) => defaults.backend_urls,
        };
        if backend_urls.is_empty() {
            return Err(ConfigError::Invalid("YEARPROGRESS_BACKEND_URLS"));
        }

        let attempts: u32 = parse_or("YEARPROGRESS_RETRY_ATTEMPTS", defaults.retry.attempts)?;
        let backoff_ms: u64 = parse_or(
            "YEARPROGRESS_RETRY_BACKOFF_MS",
            defaults.retry.backoff.as_millis() as u64,
        )?;

        Ok(Self {
            api_base_url: env::var("GITHUB_API_URL").unwrap_or(defaults.api_base_url),
            oauth_base_url: env::var("GITHUB_OAUTH_URL").unwrap_or(defaults.oauth_base_url),
            client_id: env::var("GITHUB_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GITHUB_CLIENT_ID"))?,
            backend_urls,
            retry: RetryPolicy {
                attempts: attempts.max(1),
                backoff: Duration::from_millis(backoff_ms),
            },
            gist_page_size: parse_or("YEARPROGRESS_GIST_PAGE_SIZE", defaults.gist_page_size)?
                .clamp(1, 100),
            state_path: env::var("YEARPROGRESS_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
        })
    }
}

/// Split a comma-separated list of URLs, dropping blanks and trailing slashes.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
