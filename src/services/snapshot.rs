// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One full refresh cycle against AccessLink.

use tokio::sync::Mutex;

use crate::db::{FallbackCache, FallbackError};
use crate::error::AppError;
use crate::models::{Record, Snapshot};
use crate::services::accesslink::{newest_first, AccessLink};

/// Builds a [`Snapshot`] for one linked user.
///
/// Cycles are serialized per assembler, so two overlapping refreshes can
/// never run competing daily-activity transactions against the same
/// fallback file.
#[derive(Debug)]
pub struct SnapshotAssembler {
    accesslink: AccessLink,
    fallback: FallbackCache,
    cycle: Mutex<()>,
}

impl SnapshotAssembler {
    pub fn new(accesslink: AccessLink, fallback: FallbackCache) -> Self {
        Self {
            accesslink,
            fallback,
            cycle: Mutex::new(()),
        }
    }

    pub fn accesslink(&self) -> &AccessLink {
        &self.accesslink
    }

    pub fn fallback(&self) -> &FallbackCache {
        &self.fallback
    }

    /// Fetch every dataset and assemble the snapshot.
    ///
    /// Any remote failure aborts the whole cycle. Fallback file problems are
    /// logged and do not.
    pub async fn refresh(&self, user_id: u64, access_token: &str) -> Result<Snapshot, AppError> {
        let _guard = self.cycle.lock().await;
        tracing::debug!(user_id, "Refreshing Polar data");

        let user = self.accesslink.get_userdata(user_id, access_token).await?;
        let exercises = self.accesslink.get_exercises(access_token).await?;
        let sleep = self.accesslink.get_sleep(access_token).await?;
        let recharge = self.accesslink.get_recharge(access_token).await?;
        let daily = self.daily_activities(user_id, access_token).await?;

        tracing::info!(
            user_id,
            exercises = exercises.len(),
            sleep = sleep.len(),
            recharge = recharge.len(),
            daily = daily.len(),
            "Polar data refreshed"
        );

        Ok(Snapshot::assemble(user, exercises, sleep, recharge, daily))
    }

    /// Delete the fallback file once no cycle is running.
    ///
    /// The cached daily activity belongs to whichever account was linked
    /// when it was written; it must not leak into another account's data.
    pub async fn clear_fallback(&self) -> Result<(), AppError> {
        let _guard = self.cycle.lock().await;
        self.fallback
            .remove()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        tracing::info!(path = %self.fallback.path().display(), "Fallback file cleared");
        Ok(())
    }

    /// Daily activities from a new transaction, or from the fallback file.
    async fn daily_activities(
        &self,
        user_id: u64,
        access_token: &str,
    ) -> Result<Vec<Record>, AppError> {
        let transaction = self
            .accesslink
            .daily_activity
            .create_transaction(user_id, access_token)
            .await?;

        let Some(transaction) = transaction else {
            tracing::debug!("No new daily activity available, reading fallback file");
            return Ok(self.load_fallback().await);
        };

        tracing::debug!("New daily activity available, fetching and saving to fallback file");

        let mut activities = Vec::new();
        for url in transaction.list().await? {
            activities.push(transaction.fetch(&url).await?);
        }
        let activities = newest_first(activities, "date")?;

        transaction.commit().await?;

        if let Err(e) = self.fallback.store(&activities).await {
            tracing::error!(error = %e, "Unable to write daily activities to fallback file");
        }

        Ok(activities)
    }

    async fn load_fallback(&self) -> Vec<Record> {
        match self.fallback.load().await {
            Ok(activities) => activities,
            Err(FallbackError::Read { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::warn!(
                    path = %self.fallback.path().display(),
                    "No fallback file yet, daily activity list is empty"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to get daily activities from fallback file");
                Vec::new()
            }
        }
    }
}
