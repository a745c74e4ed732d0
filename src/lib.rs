// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Year Progress: progress bars for the year, month, week, day and a custom
//! range, with milestones kept in local storage or a private GitHub gist.
//!
//! The library holds the data layer (stores, sync, progress math). The
//! binary serves the OAuth proxy that exchanges GitHub authorization codes.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;

use config::Config;
use services::GitHubOAuthClient;

/// Shared state of the OAuth proxy.
pub struct AppState {
    pub config: Config,
    pub oauth: GitHubOAuthClient,
}
