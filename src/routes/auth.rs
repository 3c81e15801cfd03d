// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polar OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::LinkedAccount;
use crate::services::{Registration, Scheduler};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long an authorization round trip may take.
const STATE_MAX_AGE_SECS: i64 = 10 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/polar", get(auth_start))
        .route("/auth/polar/callback", get(auth_callback))
}

/// Start OAuth flow - redirect to Polar Flow authorization.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let oauth_state = encode_state(
        &state.config.entry_id,
        Utc::now().timestamp(),
        &state.config.oauth_state_key,
    )
    .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to sign OAuth state")))?;

    let auth_url = state.accesslink.authorization_url(Some(&oauth_state));

    tracing::info!(
        entry_id = %state.config.entry_id,
        "Starting OAuth flow, redirecting to Polar"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// Result of linking an account.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub user_id: u64,
    pub name: String,
    pub already_registered: bool,
    /// Whether the first refresh succeeded
    pub ready: bool,
}

/// OAuth callback - exchange code for a token, register the user, link the account.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<LinkResponse>> {
    if !verify_state(
        &params.state,
        &state.config.oauth_state_key,
        &state.config.entry_id,
        Utc::now().timestamp(),
    ) {
        tracing::warn!("Invalid, expired or tampered OAuth state parameter");
        return Err(AppError::BadRequest("invalid OAuth state".to_string()));
    }

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Polar");
        return Err(AppError::BadRequest(format!("authorization failed: {}", error)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for token");
    let token = state.accesslink.exchange_code(&code).await?;

    let member_id = Uuid::new_v4().simple().to_string();
    let registration = state
        .accesslink
        .users
        .register(&token.access_token, Some(&member_id))
        .await?;
    let already_registered = registration == Registration::AlreadyRegistered;

    let userdata = state
        .accesslink
        .get_userdata(token.user_id, &token.access_token)
        .await?;
    let name = display_name(&userdata);

    let account = LinkedAccount {
        user_id: token.user_id,
        access_token: token.access_token,
        name: name.clone(),
        member_id: (!already_registered).then_some(member_id),
        linked_at: format_utc_rfc3339(Utc::now()),
    };
    let previous_user = state.poller.account().await.map(|a| a.user_id);
    state.accounts.save(&account).await?;
    state.poller.link(account).await;
    if previous_user != Some(token.user_id) {
        state.poller.assembler().clear_fallback().await?;
    }

    let ready = match state.poller.on_tick().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "First refresh after linking failed");
            false
        }
    };

    tracing::info!(user_id = token.user_id, name = %name, "OAuth successful, account linked");

    Ok(Json(LinkResponse {
        user_id: token.user_id,
        name,
        already_registered,
        ready,
    }))
}

/// "first-name last-name" from a Polar user record.
fn display_name(userdata: &crate::models::Record) -> String {
    ["first-name", "last-name"]
        .iter()
        .filter_map(|key| userdata.get(*key).and_then(|v| v.as_str()))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn sign(payload: &str, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Encode `entry_id|timestamp_hex|signature_hex` as URL-safe base64.
pub fn encode_state(entry_id: &str, timestamp: i64, secret: &[u8]) -> Option<String> {
    let payload = format!("{}|{:x}", entry_id, timestamp);
    let signature = sign(&payload, secret)?;
    Some(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Check signature, entry and age of an OAuth state parameter.
pub fn verify_state(state: &str, secret: &[u8], entry_id: &str, now: i64) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    // Entry IDs may contain '|', so split from the right
    let mut parts = state_str.rsplitn(3, '|');
    let (Some(signature_hex), Some(timestamp_hex), Some(state_entry)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let payload = format!("{}|{}", state_entry, timestamp_hex);
    let Some(expected) = sign(&payload, secret) else {
        return false;
    };

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Ok(timestamp) = i64::from_str_radix(timestamp_hex, 16) else {
        return false;
    };

    state_entry == entry_id && (0..=STATE_MAX_AGE_SECS).contains(&(now - timestamp))
}
