// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub Gist wire types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File holding the milestone collection.
pub const MILESTONES_FILE: &str = "yearprogress-milestones.json";
/// File holding the custom range settings, in the same gist.
pub const SETTINGS_FILE: &str = "yearprogress-settings.json";
/// Description given to a newly created store gist.
pub const GIST_DESCRIPTION: &str = "Year Progress Milestones";

/// Gist as returned by `GET /gists` and `GET /gists/{id}`.
///
/// The list endpoint omits file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

impl Gist {
    /// Content of a file, if present and not empty.
    pub fn file_content(&self, name: &str) -> Option<&str> {
        self.files
            .get(name)
            .and_then(|f| f.content.as_deref())
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Large files come back cut short and must not be written back as-is.
    #[serde(default)]
    pub truncated: bool,
}

/// Body of `POST /gists`.
#[derive(Debug, Serialize)]
pub struct CreateGist {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, FileContent>,
}

/// Body of `PATCH /gists/{id}`; only the named files change.
#[derive(Debug, Serialize)]
pub struct UpdateGist {
    pub files: BTreeMap<String, FileContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub content: String,
}
