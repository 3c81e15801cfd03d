// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Polar answered with a status >= 400. The raw body is kept for diagnostics.
    #[error("{status} {reason}: {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("Polar request failed: {0}")]
    Transport(String),

    /// The response arrived but did not have the expected shape.
    #[error("Unexpected Polar response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status code of a remote HTTP failure, if this is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when Polar rejected the access token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.http_status(), Some(401) | Some(403))
    }
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
            AppError::Http { status, .. } => {
                tracing::warn!(status, error = %self, "Polar API error");
                (StatusCode::BAD_GATEWAY, "polar_error", Some(self.to_string()))
            }
            AppError::Transport(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                "polar_unreachable",
                Some(msg.clone()),
            ),
            AppError::Decode(msg) => (StatusCode::BAD_GATEWAY, "polar_error", Some(msg.clone())),
            AppError::NotReady(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready",
                Some(msg.clone()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Configuration(msg) | AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Local failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
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
