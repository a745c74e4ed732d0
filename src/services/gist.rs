// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub Gist client and the gist-backed remote store.
//!
//! Handles:
//! - Finding (or creating) the user's store gist, cached per token
//! - Reading and writing the milestone and settings files
//! - Preserving unrelated files in the same gist on write

use crate::config::ClientConfig;
use crate::error::SyncError;
use crate::models::gist::{
    CreateGist, FileContent, Gist, UpdateGist, GIST_DESCRIPTION, MILESTONES_FILE, SETTINGS_FILE,
};
use crate::models::milestone::parse_collection;
use crate::models::{GitHubUser, Milestone, Settings};
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Upper bound on list pages scanned while looking for the store gist.
const MAX_GIST_PAGES: u32 = 50;

const USER_AGENT: &str = concat!("yearprogress/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// GitHub REST client for the gist endpoints.
#[derive(Clone)]
pub struct GistClient {
    http: reqwest::Client,
    base_url: String,
}

impl GistClient {
    /// Create a client against `base_url` (normally `https://api.github.com`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// List one page of the authenticated user's gists.
    pub async fn list_gists(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Gist>, SyncError> {
        let url = format!("{}/gists", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .query(&[("page", page.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await
            .map_err(unavailable)?;

        self.check_response_json(response).await
    }

    /// Get a gist with its file contents.
    pub async fn get_gist(&self, token: &str, gist_id: &str) -> Result<Gist, SyncError> {
        let url = format!("{}/gists/{}", self.base_url, gist_id);
        self.get_json(&url, token).await
    }

    /// Create a gist.
    pub async fn create_gist(&self, token: &str, body: &CreateGist) -> Result<Gist, SyncError> {
        let url = format!("{}/gists", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .json(body)
            .send()
            .await
            .map_err(unavailable)?;

        self.check_response_json(response).await
    }

    /// Update the named files of a gist.
    pub async fn update_gist(
        &self,
        token: &str,
        gist_id: &str,
        body: &UpdateGist,
    ) -> Result<(), SyncError> {
        let url = format!("{}/gists/{}", self.base_url, gist_id);

        let response = self
            .http
            .patch(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(e).into_write_failure())?;

        self.check_response(response)
            .await
            .map(|_| ())
            .map_err(SyncError::into_write_failure)
    }

    /// Get the authenticated user's profile.
    pub async fn get_user(&self, token: &str) -> Result<GitHubUser, SyncError> {
        let url = format!("{}/user", self.base_url);
        self.get_json(&url, token).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, SyncError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(unavailable)?;

        self.check_response_json(response).await
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 401 {
            tracing::warn!("GitHub rejected the access token (401)");
        }

        Err(SyncError::RemoteUnavailable {
            status: Some(status.as_u16()),
            message: format!("HTTP {}: {}", status, body),
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        self.check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::RemoteUnavailable {
                status: None,
                message: format!("JSON parse error: {}", e),
            })
    }
}

fn unavailable(e: reqwest::Error) -> SyncError {
    SyncError::RemoteUnavailable {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GistStore - remote store adapter with handle caching
// ─────────────────────────────────────────────────────────────────────────────

/// Store gist id per access token, shared with the auth adapter so logout
/// can invalidate it.
pub type HandleCache = Arc<DashMap<String, String>>;

/// Remote store adapter backed by a single private gist.
#[derive(Clone)]
pub struct GistStore {
    client: GistClient,
    handles: HandleCache,
    page_size: u32,
}

impl GistStore {
    pub fn new(client: GistClient, handles: HandleCache, page_size: u32) -> Self {
        Self {
            client,
            handles,
            page_size: page_size.clamp(1, 100),
        }
    }

    pub fn from_config(config: &ClientConfig, handles: HandleCache) -> Self {
        Self::new(
            GistClient::new(config.api_base_url.clone()),
            handles,
            config.gist_page_size,
        )
    }

    pub fn client(&self) -> &GistClient {
        &self.client
    }

    /// Cached handle for `token`, if already resolved this session.
    pub fn cached_handle(&self, token: &str) -> Option<String> {
        self.handles.get(token).map(|h| h.value().clone())
    }

    /// Forget the cached handle for one token.
    pub fn invalidate(&self, token: &str) {
        self.handles.remove(token);
    }

    /// Forget every cached handle.
    pub fn invalidate_all(&self) {
        self.handles.clear();
    }

    // ─── Handle resolution ───────────────────────────────────────

    /// Find the user's store gist, creating it if absent. Cached per token.
    pub async fn resolve_store_handle(&self, token: &str) -> Result<String, SyncError> {
        if let Some(id) = self.cached_handle(token) {
            return Ok(id);
        }

        let id = match self.find_store(token).await? {
            Some(id) => {
                tracing::info!(gist_id = %id, "Using existing store gist");
                id
            }
            None => {
                let id = self.create_store(token).await?;
                tracing::info!(gist_id = %id, "Created store gist");
                id
            }
        };

        self.handles.insert(token.to_string(), id.clone());
        Ok(id)
    }

    async fn find_store(&self, token: &str) -> Result<Option<String>, SyncError> {
        for page in 1..=MAX_GIST_PAGES {
            let gists = self.client.list_gists(token, page, self.page_size).await?;
            let count = gists.len();

            if let Some(found) = gists
                .into_iter()
                .find(|g| g.files.contains_key(MILESTONES_FILE))
            {
                return Ok(Some(found.id));
            }

            if count < self.page_size as usize {
                break;
            }
        }
        Ok(None)
    }

    async fn create_store(&self, token: &str) -> Result<String, SyncError> {
        let mut files = BTreeMap::new();
        files.insert(
            MILESTONES_FILE.to_string(),
            FileContent {
                content: "[]".to_string(),
            },
        );

        let gist = self
            .client
            .create_gist(
                token,
                &CreateGist {
                    description: GIST_DESCRIPTION.to_string(),
                    public: false,
                    files,
                },
            )
            .await?;
        Ok(gist.id)
    }

    // ─── Milestones ──────────────────────────────────────────────

    /// Load the remote milestone collection.
    ///
    /// A missing or unparsable file reads as empty; HTTP failures are errors.
    pub async fn load_milestones(&self, token: &str) -> Result<Vec<Milestone>, SyncError> {
        let gist_id = self.resolve_store_handle(token).await?;
        let gist = self.client.get_gist(token, &gist_id).await?;

        let Some(content) = gist.file_content(MILESTONES_FILE) else {
            return Ok(Vec::new());
        };

        let parsed = match parse_collection(content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(gist_id = %gist_id, error = %e, "Remote milestone file unreadable");
                return Ok(Vec::new());
            }
        };

        if parsed.repaired {
            // Persist assigned ids so later edits can find them.
            if let Err(e) = self.save_milestones(token, &parsed.milestones).await {
                tracing::warn!(error = %e, "Failed to write back repaired milestones");
            }
        }

        Ok(parsed.milestones)
    }

    /// Replace the remote milestone collection.
    pub async fn save_milestones(
        &self,
        token: &str,
        milestones: &[Milestone],
    ) -> Result<(), SyncError> {
        let content = serde_json::to_string_pretty(milestones)
            .map_err(|e| SyncError::Parse(e.to_string()))?;
        self.write_file(token, MILESTONES_FILE, content).await?;
        tracing::debug!(count = milestones.len(), "Saved milestones to gist");
        Ok(())
    }

    // ─── Settings ────────────────────────────────────────────────

    /// Load the remote settings; `None` if the file is missing or unparsable.
    pub async fn load_settings(&self, token: &str) -> Result<Option<Settings>, SyncError> {
        let gist_id = self.resolve_store_handle(token).await?;
        let gist = self.client.get_gist(token, &gist_id).await?;

        Ok(gist
            .file_content(SETTINGS_FILE)
            .and_then(|content| match serde_json::from_str(content) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote settings file unreadable");
                    None
                }
            }))
    }

    pub async fn save_settings(&self, token: &str, settings: &Settings) -> Result<(), SyncError> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| SyncError::Parse(e.to_string()))?;
        self.write_file(token, SETTINGS_FILE, content).await
    }

    /// Write one file while echoing back the rest of the gist's file set.
    ///
    /// Truncated files are left out; PATCH only touches named files, so they
    /// survive untouched.
    async fn write_file(&self, token: &str, name: &str, content: String) -> Result<(), SyncError> {
        let gist_id = self
            .resolve_store_handle(token)
            .await
            .map_err(SyncError::into_write_failure)?;
        let existing = self
            .client
            .get_gist(token, &gist_id)
            .await
            .map_err(SyncError::into_write_failure)?;

        let mut files: BTreeMap<String, FileContent> = existing
            .files
            .into_iter()
            .filter(|(_, f)| !f.truncated)
            .filter_map(|(filename, f)| f.content.map(|content| (filename, FileContent { content })))
            .collect();
        files.insert(name.to_string(), FileContent { content });

        self.client
            .update_gist(token, &gist_id, &UpdateGist { files })
            .await
    }
}
