// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Linked-account record kept by the integration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::db::files::{to_sorted_pretty_json, write_atomic};
use crate::db::filenames;
use crate::error::AppError;
use crate::models::LinkedAccount;

/// JSON file holding the linked account of one integration instance.
#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn for_entry(storage_dir: &Path, entry_id: &str) -> Self {
        Self {
            path: storage_dir.join(filenames::linked_account(entry_id)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored account, or `None` if nothing has been linked yet.
    ///
    /// Blocking; meant for start-up, before the server accepts requests.
    pub fn load(&self) -> Result<Option<LinkedAccount>, AppError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&data).map(Some).map_err(|e| {
            AppError::Storage(format!("parsing {}: {}", self.path.display(), e))
        })
    }

    /// Store the account. File I/O runs on the blocking pool.
    pub async fn save(&self, account: &LinkedAccount) -> Result<(), AppError> {
        let contents = to_sorted_pretty_json(account)
            .map_err(|e| AppError::Storage(format!("serializing account: {}", e)))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            write_atomic(&path, &contents)
                .map_err(|e| AppError::Storage(format!("writing {}: {}", path.display(), e)))
        })
        .await
        .map_err(|e| AppError::Storage(format!("account writer failed: {}", e)))??;

        tracing::info!(user_id = account.user_id, path = %self.path.display(), "Linked account stored");
        Ok(())
    }

    /// Forget the stored account. Missing files are not an error.
    pub async fn remove(&self) -> Result<(), AppError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "removing {}: {}",
                path.display(),
                e
            ))),
        })
        .await
        .map_err(|e| AppError::Storage(format!("account remover failed: {}", e)))?
    }
}
