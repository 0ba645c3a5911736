//! Freshness bookkeeping record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single freshness record. Absent on first boot; created with the
/// zero sentinel, which reads as "never synced".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub last_updated: DateTime<Utc>,
}

impl SyncMeta {
    /// The never-synced sentinel.
    pub fn unsynced() -> Self {
        Self {
            last_updated: DateTime::<Utc>::default(),
        }
    }

    pub fn is_unsynced(&self) -> bool {
        self.last_updated == DateTime::<Utc>::default()
    }
}
