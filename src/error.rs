// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types: `SyncError` for the store/sync layer, `AppError` for the
//! OAuth proxy's HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised by the store adapters, the auth adapter and the synchronizer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Stored JSON could not be parsed.
    #[error("Stored data is malformed: {0}")]
    Parse(String),

    /// Network or HTTP failure while reading from the remote store.
    #[error("Remote store unavailable: {message}")]
    RemoteUnavailable {
        status: Option<u16>,
        message: String,
    },

    /// Network or HTTP failure while writing to the remote store.
    #[error("Remote write failed: {message}")]
    RemoteWriteFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("OAuth code exchange failed: {0}")]
    AuthExchangeFailed(String),

    #[error("{0}")]
    Validation(String),

    /// Local key/value storage could not be read or written.
    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Not logged in")]
    NotAuthenticated,
}

impl SyncError {
    /// HTTP status carried by a remote failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::RemoteUnavailable { status, .. }
            | SyncError::RemoteWriteFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this error came from talking to the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnavailable { .. } | SyncError::RemoteWriteFailed { .. }
        )
    }

    /// Turn a read-side failure into the matching write-side failure.
    pub(crate) fn into_write_failure(self) -> Self {
        match self {
            SyncError::RemoteUnavailable { status, message } => {
                SyncError::RemoteWriteFailed { status, message }
            }
            other => other,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// GitHub rejected the authorization code.
    #[error("GitHub OAuth error: {0}")]
    OAuthRejected(String),

    /// GitHub could not be reached or answered with garbage.
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::OAuthRejected(msg) => {
                (StatusCode::BAD_REQUEST, "oauth_rejected", Some(msg.clone()))
            }
            AppError::GitHubApi(msg) => {
                tracing::warn!(error = %msg, "GitHub API error");
                (StatusCode::BAD_GATEWAY, "github_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
