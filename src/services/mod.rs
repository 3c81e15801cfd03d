// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - AccessLink client and refresh logic.

pub mod accesslink;
pub mod oauth;
pub mod poller;
pub mod snapshot;
pub mod transaction;
pub mod transport;

pub use accesslink::{AccessLink, PolarUrls, Registration};
pub use poller::{run_every, Poller, RefreshStatus, Scheduler};
pub use snapshot::SnapshotAssembler;
pub use transaction::Transaction;
