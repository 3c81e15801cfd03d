// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer (JSON files in the storage directory).

pub mod accounts;
pub mod fallback;
pub mod files;

pub use accounts::AccountStore;
pub use fallback::{FallbackCache, FallbackError};

/// File names, keyed by integration entry ID.
pub mod filenames {
    pub fn daily_data(entry_id: &str) -> String {
        format!("polar_dailydata_{}.json", entry_id)
    }

    pub fn linked_account(entry_id: &str) -> String {
        format!("polar_entry_{}.json", entry_id)
    }
}
