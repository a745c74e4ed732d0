// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - store adapters, auth and the synchronizer.

pub mod auth;
pub mod gist;
pub mod github_oauth;
pub mod local;
pub mod progress;
pub mod sync;

pub use auth::AuthService;
pub use gist::{GistClient, GistStore, HandleCache};
pub use github_oauth::GitHubOAuthClient;
pub use local::LocalStore;
pub use sync::{MilestoneSync, SessionState, SyncEvent, SyncReport};
