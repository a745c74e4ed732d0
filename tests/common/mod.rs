// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: an in-process stand-in for the GitHub API and the
//! OAuth proxy, plus helpers to build clients and apps against it.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use yearprogress::config::{ClientConfig, Config, RetryPolicy};
use yearprogress::models::gist::MILESTONES_FILE;
use yearprogress::routes::create_router;
use yearprogress::services::{GitHubOAuthClient, MilestoneSync, SyncReport};
use yearprogress::storage::MemoryStore;
use yearprogress::AppState;

pub const TEST_TOKEN: &str = "gho_test_token";
pub const TEST_LOGIN: &str = "octocat";
/// Authorization code the mock token endpoint refuses.
pub const BAD_CODE: &str = "bad-code";

type MockResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Mock GitHub: gists, the user endpoint, the OAuth token endpoint and the
/// proxy's callback route, all on one listener.
#[derive(Default)]
pub struct MockGitHub {
    /// gist id -> filename -> content
    gists: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    next_id: AtomicUsize,
    /// Non-zero: every gist read answers with this status
    pub fail_reads: AtomicU16,
    /// Non-zero: every gist create/update answers with this status
    pub fail_writes: AtomicU16,
    /// Non-zero: the callback route answers with this status
    pub callback_status: AtomicU16,
    /// Delay applied to `GET /gists/{id}`
    pub read_delay_ms: AtomicU64,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub patch_calls: AtomicUsize,
    pub callback_calls: AtomicUsize,
}

impl MockGitHub {
    /// Seed a gist holding `files`, returning its id.
    pub fn add_gist(&self, files: &[(&str, &str)]) -> String {
        let id = format!("gist{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let files = files
            .iter()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect();
        self.gists.lock().unwrap().insert(id.clone(), files);
        id
    }

    pub fn file(&self, gist_id: &str, name: &str) -> Option<String> {
        self.gists
            .lock()
            .unwrap()
            .get(gist_id)
            .and_then(|files| files.get(name).cloned())
    }

    /// Id of the first gist carrying the milestones file.
    pub fn store_id(&self) -> Option<String> {
        self.gists
            .lock()
            .unwrap()
            .iter()
            .find(|(_, files)| files.contains_key(MILESTONES_FILE))
            .map(|(id, _)| id.clone())
    }

    /// Parsed content of a file in the store gist.
    pub fn store_json(&self, name: &str) -> Option<Value> {
        let id = self.store_id()?;
        let raw = self.file(&id, name)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn gist_count(&self) -> usize {
        self.gists.lock().unwrap().len()
    }

    pub fn fail_reads_with(&self, status: u16) {
        self.fail_reads.store(status, Ordering::SeqCst);
    }

    pub fn fail_writes_with(&self, status: u16) {
        self.fail_writes.store(status, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn mock_error(status: u16) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "message": "mock failure" })))
}

fn require_bearer(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));
    if authorized {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Requires authentication" })),
        ))
    }
}

fn check(status: &AtomicU16) -> Result<(), (StatusCode, Json<Value>)> {
    match status.load(Ordering::SeqCst) {
        0 => Ok(()),
        code => Err(mock_error(code)),
    }
}

fn gist_json(id: &str, files: &BTreeMap<String, String>, with_content: bool) -> Value {
    let files: Map<String, Value> = files
        .iter()
        .map(|(name, content)| {
            let file = if with_content {
                json!({ "filename": name, "content": content, "truncated": false })
            } else {
                json!({ "filename": name })
            };
            (name.clone(), file)
        })
        .collect();
    json!({ "id": id, "description": "", "public": false, "files": files })
}

#[derive(Deserialize)]
struct ListQuery {
    page: usize,
    per_page: usize,
}

async fn list_gists(
    State(mock): State<Arc<MockGitHub>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> MockResult {
    require_bearer(&headers)?;
    mock.list_calls.fetch_add(1, Ordering::SeqCst);
    check(&mock.fail_reads)?;

    let gists = mock.gists.lock().unwrap();
    let page: Vec<Value> = gists
        .iter()
        .skip(query.page.saturating_sub(1) * query.per_page)
        .take(query.per_page)
        .map(|(id, files)| gist_json(id, files, false))
        .collect();
    Ok(Json(Value::Array(page)))
}

async fn get_gist(
    State(mock): State<Arc<MockGitHub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> MockResult {
    require_bearer(&headers)?;
    let delay = mock.read_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    check(&mock.fail_reads)?;

    let gists = mock.gists.lock().unwrap();
    match gists.get(&id) {
        Some(files) => Ok(Json(gist_json(&id, files, true))),
        None => Err(mock_error(404)),
    }
}

fn body_files(body: &Value) -> BTreeMap<String, Option<String>> {
    body.get("files")
        .and_then(Value::as_object)
        .map(|files| {
            files
                .iter()
                .map(|(name, file)| {
                    let content = file
                        .get("content")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    (name.clone(), content)
                })
                .collect()
        })
        .unwrap_or_default()
}

async fn create_gist(
    State(mock): State<Arc<MockGitHub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    require_bearer(&headers)?;
    mock.create_calls.fetch_add(1, Ordering::SeqCst);
    check(&mock.fail_writes)?;

    let files: BTreeMap<String, String> = body_files(&body)
        .into_iter()
        .filter_map(|(name, content)| content.map(|c| (name, c)))
        .collect();
    let id = format!("gist{}", mock.next_id.fetch_add(1, Ordering::SeqCst));
    let gist = gist_json(&id, &files, true);
    mock.gists.lock().unwrap().insert(id, files);
    Ok((StatusCode::CREATED, Json(gist)))
}

async fn patch_gist(
    State(mock): State<Arc<MockGitHub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> MockResult {
    require_bearer(&headers)?;
    mock.patch_calls.fetch_add(1, Ordering::SeqCst);
    check(&mock.fail_writes)?;

    let mut gists = mock.gists.lock().unwrap();
    let Some(files) = gists.get_mut(&id) else {
        return Err(mock_error(404));
    };
    for (name, content) in body_files(&body) {
        match content {
            Some(content) => {
                files.insert(name, content);
            }
            None => {
                files.remove(&name);
            }
        }
    }
    Ok(Json(gist_json(&id, files, true)))
}

async fn get_user(headers: HeaderMap) -> MockResult {
    require_bearer(&headers)?;
    Ok(Json(json!({
        "login": TEST_LOGIN,
        "id": 583231,
        "name": "The Octocat",
    })))
}

async fn access_token(Json(body): Json<Value>) -> Json<Value> {
    if body.get("code").and_then(Value::as_str) == Some(BAD_CODE) {
        return Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
        }));
    }
    Json(json!({ "access_token": TEST_TOKEN, "token_type": "bearer", "scope": "gist" }))
}

async fn proxy_callback(State(mock): State<Arc<MockGitHub>>, Json(body): Json<Value>) -> MockResult {
    mock.callback_calls.fetch_add(1, Ordering::SeqCst);
    check(&mock.callback_status)?;

    if body.get("code").and_then(Value::as_str) == Some(BAD_CODE) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "oauth_rejected" })),
        ));
    }
    Ok(Json(json!({ "access_token": TEST_TOKEN })))
}

/// Start the mock on an ephemeral port; returns its base URL.
pub async fn spawn_mock_github() -> (String, Arc<MockGitHub>) {
    let mock = Arc::new(MockGitHub::default());

    let app = Router::new()
        .route("/gists", get(list_gists).post(create_gist))
        .route("/gists/{id}", get(get_gist).patch(patch_gist))
        .route("/user", get(get_user))
        .route("/login/oauth/access_token", post(access_token))
        .route("/auth/github/callback", post(proxy_callback))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });

    (format!("http://{}", addr), mock)
}

/// An address nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Client config pointing every endpoint at `base_url`.
pub fn client_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_base_url: base_url.to_string(),
        oauth_base_url: base_url.to_string(),
        client_id: "test-client".to_string(),
        backend_urls: vec![base_url.to_string()],
        retry: RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(10),
        },
        gist_page_size: 100,
        ..ClientConfig::default()
    }
}

/// Synchronizer over a fresh in-memory store.
pub fn create_sync(config: &ClientConfig) -> (MilestoneSync, Arc<MemoryStore>) {
    let kv = Arc::new(MemoryStore::new());
    (MilestoneSync::from_config(config, kv.clone()), kv)
}

/// Pull the `state` parameter out of an authorize URL.
pub fn state_param(url: &str) -> String {
    url.split("state=")
        .nth(1)
        .map(|s| s.split('&').next().unwrap_or(s).to_string())
        .expect("authorize URL has no state")
}

/// Run the full login flow with a good code.
pub async fn login(sync: &MilestoneSync) -> Result<SyncReport, yearprogress::error::SyncError> {
    let url = sync
        .auth()
        .begin_login("http://localhost:5500/")
        .expect("begin_login failed");
    sync.login("good-code", &state_param(&url)).await
}

/// Milestone collection JSON for seeding.
pub fn milestones_json(entries: &[(&str, &str, &str)]) -> String {
    let list: Vec<Value> = entries
        .iter()
        .map(|(id, date, label)| json!({ "id": id, "date": date, "label": label }))
        .collect();
    Value::Array(list).to_string()
}

/// Create the proxy app with GitHub's OAuth endpoints at `oauth_url`.
pub fn create_test_app(oauth_url: &str) -> (Router, Arc<AppState>) {
    let config = Config {
        github_oauth_url: oauth_url.to_string(),
        ..Config::test_default()
    };
    let state = Arc::new(AppState {
        oauth: GitHubOAuthClient::new(&config),
        config,
    });
    (create_router(state.clone()), state)
}
