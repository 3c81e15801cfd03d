// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-interval refresh driver.
//!
//! The host side of the integration only needs [`Scheduler::on_tick`]; the
//! interval and shutdown belong to whoever calls [`run_every`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::models::{LinkedAccount, Snapshot};
use crate::services::snapshot::SnapshotAssembler;
use crate::time_utils::format_utc_rfc3339;

/// Something that can produce a fresh snapshot on demand.
pub trait Scheduler {
    fn on_tick(&self) -> impl Future<Output = Result<Arc<Snapshot>, AppError>> + Send;
}

/// Call `scheduler.on_tick()` every `period`, forever.
///
/// The first tick fires immediately. Failures are logged and the loop
/// carries on; retry policy is simply "try again next tick".
pub async fn run_every<S: Scheduler>(scheduler: &S, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = scheduler.on_tick().await {
            tracing::warn!(error = %e, "Scheduled refresh failed");
        }
    }
}

/// Outcome of the most recent refresh attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshStatus {
    pub last_attempt: Option<String>,
    pub last_success: Option<String>,
    pub last_error: Option<String>,
}

/// Latest good snapshot, tagged with the account generation it belongs to.
#[derive(Debug, Default)]
struct Published {
    /// Bumped on every link and unlink
    generation: u64,
    snapshot: Option<Arc<Snapshot>>,
}

/// Holds the linked account and the latest good snapshot.
///
/// A refresh only publishes its result if the account it started with is
/// still the linked one; a cycle overtaken by `link`/`unlink` is dropped.
#[derive(Debug)]
pub struct Poller {
    assembler: SnapshotAssembler,
    account: RwLock<Option<LinkedAccount>>,
    latest: RwLock<Published>,
    status: RwLock<RefreshStatus>,
}

impl Poller {
    pub fn new(assembler: SnapshotAssembler, account: Option<LinkedAccount>) -> Self {
        Self {
            assembler,
            account: RwLock::new(account),
            latest: RwLock::new(Published::default()),
            status: RwLock::new(RefreshStatus::default()),
        }
    }

    pub fn assembler(&self) -> &SnapshotAssembler {
        &self.assembler
    }

    pub async fn account(&self) -> Option<LinkedAccount> {
        self.account.read().await.clone()
    }

    /// Switch to a newly linked account. The previous snapshot is dropped.
    pub async fn link(&self, account: LinkedAccount) {
        tracing::info!(user_id = account.user_id, "Polar account linked");
        let mut latest = self.latest.write().await;
        latest.generation += 1;
        latest.snapshot = None;
        *self.account.write().await = Some(account);
    }

    /// Forget the linked account and its data.
    pub async fn unlink(&self) -> Option<LinkedAccount> {
        let mut latest = self.latest.write().await;
        latest.generation += 1;
        latest.snapshot = None;
        self.account.write().await.take()
    }

    /// Latest snapshot, if the most recent refresh succeeded.
    pub async fn latest(&self) -> Result<Arc<Snapshot>, AppError> {
        let latest = self.latest.read().await.snapshot.clone();
        if let Some(snapshot) = latest {
            return Ok(snapshot);
        }

        let status = self.status.read().await;
        let reason = match &status.last_error {
            Some(error) => format!("last refresh failed: {}", error),
            None => "no successful refresh yet".to_string(),
        };
        Err(AppError::NotReady(reason))
    }

    pub async fn status(&self) -> RefreshStatus {
        self.status.read().await.clone()
    }

    async fn refresh(&self) -> Result<Arc<Snapshot>, AppError> {
        let (generation, account) = {
            let latest = self.latest.read().await;
            (latest.generation, self.account().await)
        };
        let Some(account) = account else {
            return Err(AppError::NotReady("no Polar account linked".to_string()));
        };

        let started = format_utc_rfc3339(Utc::now());
        let result = self
            .assembler
            .refresh(account.user_id, &account.access_token)
            .await;

        let mut status = self.status.write().await;
        let mut latest = self.latest.write().await;

        if latest.generation != generation {
            tracing::info!(
                user_id = account.user_id,
                "Account changed during refresh, discarding result"
            );
            return Err(AppError::NotReady(
                "account changed during refresh".to_string(),
            ));
        }

        status.last_attempt = Some(started.clone());

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                latest.snapshot = Some(snapshot.clone());
                status.last_success = Some(started);
                status.last_error = None;
                Ok(snapshot)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    tracing::error!(
                        user_id = account.user_id,
                        "Polar rejected the access token, the account must be linked again"
                    );
                }
                latest.snapshot = None;
                status.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl Scheduler for Poller {
    async fn on_tick(&self) -> Result<Arc<Snapshot>, AppError> {
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FallbackCache;
    use crate::services::accesslink::AccessLink;

    fn poller() -> Poller {
        let accesslink = AccessLink::new("id", "secret", None).unwrap();
        let assembler = SnapshotAssembler::new(accesslink, FallbackCache::new("unused.json"));
        Poller::new(assembler, None)
    }

    #[tokio::test]
    async fn test_tick_without_account_is_not_ready() {
        let poller = poller();
        assert!(matches!(poller.on_tick().await, Err(AppError::NotReady(_))));
        assert!(matches!(poller.latest().await, Err(AppError::NotReady(_))));
        assert_eq!(poller.status().await, RefreshStatus::default());
    }

    #[tokio::test]
    async fn test_link_and_unlink() {
        let poller = poller();
        let account = LinkedAccount {
            user_id: 1,
            access_token: "t".to_string(),
            name: "A B".to_string(),
            member_id: None,
            linked_at: "2024-01-01T00:00:00Z".to_string(),
        };

        poller.link(account.clone()).await;
        assert_eq!(poller.account().await, Some(account.clone()));
        assert_eq!(poller.unlink().await, Some(account));
        assert_eq!(poller.account().await, None);
    }
}
