// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Consolidated result of one refresh cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An AccessLink JSON object, passed through unchanged.
pub type Record = Map<String, Value>;

/// All datasets fetched in one refresh, plus the newest item of each list.
///
/// Lists are sorted newest first; `last_*` is the first element of the
/// matching list or an empty record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "userdata")]
    pub user: Record,
    #[serde(rename = "exercisedata")]
    pub exercises: Vec<Record>,
    #[serde(rename = "sleepdata")]
    pub sleep: Vec<Record>,
    #[serde(rename = "rechargedata")]
    pub recharge: Vec<Record>,
    #[serde(rename = "dailydata")]
    pub daily: Vec<Record>,
    pub last_exercise: Record,
    pub last_sleep: Record,
    pub last_recharge: Record,
    pub last_daily: Record,
}

impl Snapshot {
    /// Build a snapshot from already sorted datasets.
    pub fn assemble(
        user: Record,
        exercises: Vec<Record>,
        sleep: Vec<Record>,
        recharge: Vec<Record>,
        daily: Vec<Record>,
    ) -> Self {
        Self {
            last_exercise: most_recent(&exercises),
            last_sleep: most_recent(&sleep),
            last_recharge: most_recent(&recharge),
            last_daily: most_recent(&daily),
            user,
            exercises,
            sleep,
            recharge,
            daily,
        }
    }

    /// Look up a single-record dataset by its serialized name.
    pub fn category(&self, name: &str) -> Option<&Record> {
        match name {
            "userdata" => Some(&self.user),
            "last_exercise" => Some(&self.last_exercise),
            "last_sleep" => Some(&self.last_sleep),
            "last_recharge" => Some(&self.last_recharge),
            "last_daily" => Some(&self.last_daily),
            _ => None,
        }
    }
}

fn most_recent(records: &[Record]) -> Record {
    records.first().cloned().unwrap_or_default()
}
