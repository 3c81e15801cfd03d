// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Polar AccessLink sync: periodic refresh of Polar fitness data
//!
//! This crate provides the AccessLink client (OAuth2, transactions) and a
//! small service that keeps a consolidated snapshot of a linked user's
//! exercises, sleep, nightly recharge and daily activity.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{AccountStore, FallbackCache};
use error::AppError;
use services::accesslink::AccessLink;
use services::transport::Credentials;
use services::{Poller, SnapshotAssembler};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub accesslink: AccessLink,
    pub accounts: AccountStore,
    pub poller: Poller,
}

impl AppState {
    /// Wire up the client, storage and poller for one integration instance.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            config.polar_client_id.clone(),
            config.polar_client_secret.clone(),
            Some(config.callback_url()),
        )?;
        let accesslink = AccessLink::with_urls(credentials, &config.polar_urls)?;

        let accounts = AccountStore::for_entry(&config.storage_dir, &config.entry_id);
        let account = accounts.load()?;

        let fallback = FallbackCache::for_entry(&config.storage_dir, &config.entry_id);
        let poller = Poller::new(SnapshotAssembler::new(accesslink.clone(), fallback), account);

        Ok(Self {
            config,
            accesslink,
            accounts,
            poller,
        })
    }
}
