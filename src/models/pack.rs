//! Purchasable pack model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A purchasable pack as published by the upstream catalog.
///
/// The availability date is kept as the raw upstream string so records
/// round-trip unchanged; callers go through [`Pack::date_available`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    /// Upstream pack code, unique key.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Upstream numeric id.
    pub id: i64,

    /// Release date as `YYYY-MM-DD`.
    pub available: String,
}

impl Pack {
    /// Parsed release date. Unparsable dates degrade to the epoch
    /// sentinel rather than erroring, matching the decklist timestamp
    /// behavior.
    pub fn date_available(&self) -> NaiveDate {
        NaiveDate::parse_from_str(&self.available, "%Y-%m-%d").unwrap_or_default()
    }
}
