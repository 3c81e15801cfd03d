// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for reading and managing the linked account's data.

use crate::error::{AppError, Result};
use crate::models::{AvailableUserData, Record, Snapshot};
use crate::services::{RefreshStatus, Scheduler};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/snapshot/{category}", get(get_snapshot_category))
        .route("/api/refresh", post(refresh))
        .route("/api/notifications", get(get_notifications))
        .route("/api/account", delete(delete_account))
}

// ─── Snapshot ────────────────────────────────────────────────

/// Latest snapshot; 503 until a refresh has succeeded.
async fn get_snapshot(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>> {
    let snapshot = state.poller.latest().await?;
    Ok(Json(snapshot.as_ref().clone()))
}

/// One single-record dataset (`userdata`, `last_daily`, ...).
async fn get_snapshot_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Record>> {
    let snapshot = state.poller.latest().await?;
    snapshot
        .category(&category)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::BadRequest(format!("unknown category {:?}", category)))
}

/// Run a refresh now instead of waiting for the next tick.
async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>> {
    let snapshot = state.poller.on_tick().await?;
    Ok(Json(snapshot.as_ref().clone()))
}

// ─── Status ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub linked: bool,
    pub user_id: Option<u64>,
    pub name: Option<String>,
    pub scan_interval_minutes: u64,
    pub last_attempt: Option<String>,
    pub last_success: Option<String>,
    pub last_error: Option<String>,
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let account = state.poller.account().await;
    let RefreshStatus {
        last_attempt,
        last_success,
        last_error,
    } = state.poller.status().await;

    Json(StatusResponse {
        linked: account.is_some(),
        user_id: account.as_ref().map(|a| a.user_id),
        name: account.map(|a| a.name),
        scan_interval_minutes: state.config.scan_interval_minutes,
        last_attempt,
        last_success,
        last_error,
    })
}

// ─── Notifications ───────────────────────────────────────────

/// Data Polar has waiting for this client.
async fn get_notifications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AvailableUserData>>> {
    let available = state.accesslink.pull_notifications.list().await?;
    Ok(Json(available))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// De-register the user from this client and forget the local account.
async fn delete_account(State(state): State<Arc<AppState>>) -> Result<Json<DeleteAccountResponse>> {
    let account = state
        .poller
        .account()
        .await
        .ok_or_else(|| AppError::NotReady("no Polar account linked".to_string()))?;

    state
        .accesslink
        .users
        .delete(account.user_id, &account.access_token)
        .await?;

    state.accounts.remove().await?;
    state.poller.unlink().await;
    state.poller.assembler().clear_fallback().await?;

    tracing::info!(user_id = account.user_id, "Polar account unlinked");

    Ok(Json(DeleteAccountResponse {
        success: true,
        message: format!("User {} de-registered", account.user_id),
    }))
}
