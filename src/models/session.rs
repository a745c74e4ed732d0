//! Authenticated session model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GitHub user profile. Fields other than `login` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bearer token plus the profile it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: GitHubUser,
}
