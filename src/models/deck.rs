//! Community decklist model, kept in its upstream wire shape.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DECK_ASPECTS;

/// A published decklist.
///
/// Timestamps arrive as RFC 3339 strings and are stored raw; the parsed
/// accessors degrade to the epoch sentinel on malformed input instead of
/// erroring, so one bad record cannot poison a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decklist {
    /// Upstream decklist id, unique key.
    pub id: i64,

    /// Creation timestamp, RFC 3339.
    pub date_creation: String,

    /// Last-update timestamp, RFC 3339.
    pub date_update: String,

    /// Card code → copy count.
    #[serde(default)]
    pub slots: HashMap<String, u32>,

    /// Free-form deck metadata; the aspect set is derived from it by
    /// substring search.
    #[serde(default)]
    pub meta: String,

    /// Code of the hero card the deck is built around.
    #[serde(rename = "investigator_code")]
    pub hero_code: String,
}

impl Decklist {
    pub fn date_created(&self) -> DateTime<Utc> {
        parse_or_epoch(&self.date_creation)
    }

    pub fn date_updated(&self) -> DateTime<Utc> {
        parse_or_epoch(&self.date_update)
    }

    /// Aspects this deck is committed to, derived from the metadata blob.
    pub fn aspects(&self) -> Vec<String> {
        DECK_ASPECTS
            .iter()
            .filter(|aspect| self.meta.contains(*aspect))
            .map(|aspect| aspect.to_string())
            .collect()
    }
}

fn parse_or_epoch(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
