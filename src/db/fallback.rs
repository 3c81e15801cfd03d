// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fallback cache of the last committed daily-activity list.
//!
//! Written only after a transaction commit succeeds; read only when Polar
//! has no new daily-activity transaction to offer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::db::files::{to_sorted_pretty_json, write_atomic};
use crate::db::filenames;
use crate::models::Record;

/// Errors reading or writing the fallback file.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("unable to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid daily activity list in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unable to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// JSON file holding the daily-activity list of one integration instance.
#[derive(Debug, Clone)]
pub struct FallbackCache {
    path: PathBuf,
}

impl FallbackCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file for `entry_id` inside `storage_dir`.
    pub fn for_entry(storage_dir: &Path, entry_id: &str) -> Self {
        Self::new(storage_dir.join(filenames::daily_data(entry_id)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached list.
    pub async fn load(&self) -> Result<Vec<Record>, FallbackError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_records(&path))
            .await
            .map_err(|e| FallbackError::Read {
                path: self.path.clone(),
                source: io::Error::other(e),
            })?
    }

    /// Replace the cached list (pretty-printed, keys sorted).
    pub async fn store(&self, records: &[Record]) -> Result<(), FallbackError> {
        let contents = to_sorted_pretty_json(&records).map_err(|e| FallbackError::Write {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            write_atomic(&path, &contents).map_err(|source| FallbackError::Write { path, source })
        })
        .await
        .map_err(|e| FallbackError::Write {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?
    }

    /// Delete the cached list. A missing file is not an error.
    pub async fn remove(&self) -> Result<(), FallbackError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FallbackError::Write { path, source }),
        })
        .await
        .map_err(|e| FallbackError::Write {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?
    }
}

fn read_records(path: &Path) -> Result<Vec<Record>, FallbackError> {
    let data = fs::read(path).map_err(|source| FallbackError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| FallbackError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
