// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wire types returned by the Polar OAuth and notification endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token response from the Polar authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Polar user ID the token belongs to
    #[serde(rename = "x_user_id")]
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Token lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Remaining token metadata, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the pull-notifications list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableUserData {
    #[serde(rename = "user-id")]
    pub user_id: u64,
    /// `ACTIVITY_SUMMARY`, `EXERCISE` or `PHYSICAL_INFORMATION`
    #[serde(rename = "data-type")]
    pub data_type: String,
    pub url: String,
}

/// Envelope of the pull-notifications response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AvailableUserDataList {
    #[serde(rename = "available-user-data", default)]
    pub available_user_data: Vec<AvailableUserData>,
}
