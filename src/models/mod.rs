// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod snapshot;
pub mod token;

pub use account::LinkedAccount;
pub use snapshot::{Record, Snapshot};
pub use token::{AvailableUserData, TokenResponse};
