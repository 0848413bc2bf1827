use std::collections::HashMap;

use chrono::Duration;

use crate::db_types::ProjectId;

pub const DEFAULT_REPLAY_WINDOW_DAYS: i64 = 14;
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 100;
pub const MIN_INSERT_CHUNK_SIZE: usize = 5;
pub const DEFAULT_RECOVERY_BATCH_SIZE: u32 = 500;
pub const MAX_RECOVERY_BATCH_SIZE: u32 = 5_000;

/// Tuning knobs shared by the reconciliation APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationOptions {
    /// How far back the raw-event replay looks
    pub replay_window: Duration,
    /// Upper bound on the number of ledger events written per insert call
    pub insert_chunk_size: usize,
    /// Default page size of the item-type recovery
    pub recovery_batch_size: u32,
}

impl Default for ReconciliationOptions {
    fn default() -> Self {
        Self {
            replay_window: Duration::days(DEFAULT_REPLAY_WINDOW_DAYS),
            insert_chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
            recovery_batch_size: DEFAULT_RECOVERY_BATCH_SIZE,
        }
    }
}

impl ReconciliationOptions {
    pub fn with_replay_window_days(mut self, days: i64) -> Self {
        self.replay_window = Duration::days(days.max(1));
        self
    }

    /// Sets the insert chunk size. Values below [`MIN_INSERT_CHUNK_SIZE`] are raised to it, so a chunk can always hold
    /// every event of one order.
    pub fn with_insert_chunk_size(mut self, size: usize) -> Self {
        self.insert_chunk_size = size.max(MIN_INSERT_CHUNK_SIZE);
        self
    }

    pub fn with_recovery_batch_size(mut self, size: u32) -> Self {
        self.recovery_batch_size = size.clamp(1, MAX_RECOVERY_BATCH_SIZE);
        self
    }
}

/// A static fallback directory of project codes, used when a code is not found in the datastore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDirectory {
    codes: HashMap<String, ProjectId>,
}

impl ProjectDirectory {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ProjectId>,
    {
        let codes = pairs.into_iter().map(|(k, v)| (k.as_ref().trim().to_ascii_lowercase(), v.into())).collect();
        Self { codes }
    }

    /// Codes are matched case-insensitively.
    pub fn resolve(&self, code: &str) -> Option<&ProjectId> {
        self.codes.get(&code.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
