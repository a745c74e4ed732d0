// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth code exchange route.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/github/callback", post(auth_callback))
}

/// Body posted by the frontend after GitHub redirects back with `?code=`.
#[derive(Deserialize)]
pub struct CallbackBody {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
pub struct CallbackResponse {
    pub access_token: String,
}

/// Exchange the authorization code for an access token.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CallbackBody>, JsonRejection>,
) -> Result<Json<CallbackResponse>> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable callback body");
        AppError::BadRequest("Missing code".to_string())
    })?;

    let code = body
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing code".to_string()))?;

    tracing::info!("Exchanging authorization code for token");

    let access_token = state.oauth.exchange_code(code.trim()).await?;

    Ok(Json(CallbackResponse { access_token }))
}
