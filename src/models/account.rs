// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Linked Polar account stored by the integration.

use serde::{Deserialize, Serialize};

/// Polar user linked to this integration instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Polar user ID (`x_user_id` from the token exchange)
    pub user_id: u64,
    /// Long-lived AccessLink access token
    pub access_token: String,
    /// Display name ("first-name last-name")
    pub name: String,
    /// Member ID sent when registering the user with this client
    pub member_id: Option<String>,
    /// When the account was linked (RFC3339)
    pub linked_at: String,
}
