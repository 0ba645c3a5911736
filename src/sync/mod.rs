//! Sync controller.
//!
//! Owns the freshness timestamp and the full refresh pipeline:
//! packs → cards → heroes → incremental deck crawl → card values →
//! pack values → new freshness stamp. The decide-and-trigger step is
//! serialized behind one mutex so concurrent requests never start
//! overlapping refreshes; a first-boot refresh blocks the caller, a
//! stale-cache refresh runs detached.

pub mod normalize;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, Duration, NaiveDate, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::calculate::{self, CalculateError};
use crate::models::{CardIndex, PackValue, SyncMeta};
use crate::store::{CatalogStore, StoreError};
use crate::upstream::{CatalogProvider, UpstreamError};
use normalize::NormalizeError;

/// Errors that can occur during a refresh.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Calculate error: {0}")]
    Calculate(#[from] CalculateError),
}

/// Configuration for the sync controller.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum age of cached derived data before a refresh is triggered.
    pub refresh_window: Duration,

    /// First day of the deck crawl when no decks are stored yet.
    pub crawl_epoch: NaiveDate,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_window: Duration::hours(12),
            crawl_epoch: NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
        }
    }
}

/// The sync controller. All writes to the derived collections go through
/// here; the query layer only ever reads.
pub struct SyncController {
    store: Arc<dyn CatalogStore>,
    upstream: Arc<dyn CatalogProvider>,
    config: SyncConfig,

    /// Guards only the check-timestamp / decide-to-trigger sequence,
    /// never a refresh itself.
    gate: Mutex<()>,

    /// Handle of the last spawned background refresh. Retained so tests
    /// can await completion deterministically and so a still-running
    /// refresh is never doubled up.
    background: Mutex<Option<JoinHandle<()>>>,
}

impl SyncController {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        upstream: Arc<dyn CatalogProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            upstream,
            config,
            gate: Mutex::new(()),
            background: Mutex::new(None),
        }
    }

    /// Freshness gate, run before every query.
    ///
    /// Never synced: refresh now, blocking the caller, since first-time data
    /// must exist before any query can answer. Stale: trigger a detached
    /// refresh and serve from cache; its failure is logged, observable
    /// only through the next freshness check. Fresh: no-op.
    pub async fn ensure_fresh(self: &Arc<Self>) -> Result<(), SyncError> {
        let _guard = self.gate.lock().await;

        self.store.ensure_meta().await?;
        let meta = self.store.get_meta().await?;

        if meta.is_unsynced() {
            info!("No local data yet, running first-time sync");
            return self.refresh_all().await;
        }

        if Utc::now() >= meta.last_updated + self.config.refresh_window {
            let mut background = self.background.lock().await;
            let running = background.as_ref().is_some_and(|handle| !handle.is_finished());
            if !running {
                info!("Cached data is stale, refreshing in the background");
                let controller = Arc::clone(self);
                *background = Some(tokio::spawn(async move {
                    if let Err(e) = controller.refresh_all().await {
                        error!("Background refresh failed: {}", e);
                    }
                }));
            }
        }

        Ok(())
    }

    /// Await the last spawned background refresh, if any. Test hook; the
    /// serving path never blocks on this.
    pub async fn wait_for_background(&self) {
        let handle = self.background.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Full refresh pipeline. Each step aborts the rest on error;
    /// collections written by earlier steps stay committed.
    pub async fn refresh_all(&self) -> Result<(), SyncError> {
        self.store.ping().await?;

        self.refresh_packs().await?;
        let index = self.refresh_cards().await?;
        self.refresh_heroes(&index).await?;

        let new_decks = self.crawl_decks().await?;
        info!("Deck crawl added {} new decks", new_decks);

        self.refresh_card_values(&index).await?;
        self.refresh_pack_values().await?;

        self.store
            .set_meta(SyncMeta {
                last_updated: Utc::now(),
            })
            .await?;
        Ok(())
    }

    async fn refresh_packs(&self) -> Result<(), SyncError> {
        info!("Refreshing pack catalog");
        let packs = self.upstream.all_packs().await?;
        self.store
            .replace_packs(packs.into_iter().map(Into::into).collect())
            .await?;
        Ok(())
    }

    async fn refresh_cards(&self) -> Result<CardIndex, SyncError> {
        info!("Refreshing card catalog");

        let pack_map: HashMap<_, _> = self
            .store
            .all_packs()
            .await?
            .into_iter()
            .map(|pack| (pack.code.clone(), pack))
            .collect();

        let raw_cards = self.upstream.all_cards().await?;
        let index = normalize::normalize_cards(raw_cards, &pack_map)?;
        self.store.replace_cards(index.canonical_cards()).await?;
        Ok(index)
    }

    async fn refresh_heroes(&self, index: &CardIndex) -> Result<(), SyncError> {
        info!("Refreshing hero list");
        let heroes = normalize::build_heroes(index)?;
        self.store.replace_heroes(heroes).await?;
        Ok(())
    }

    /// Day-by-day incremental deck crawl, from the day after the latest
    /// stored deck (or the configured epoch) up to today. A transient
    /// upstream failure reads as "no decks that day"; anything else is
    /// fatal.
    async fn crawl_decks(&self) -> Result<u64, SyncError> {
        let start = match self.store.latest_deck().await? {
            Some(deck) => deck.date_created().date_naive() + Days::new(1),
            None => self.config.crawl_epoch,
        };
        let today = Utc::now().date_naive();

        let mut inserted = 0u64;
        let mut day = start;
        while day <= today {
            match self.upstream.decklists_by_date(day).await {
                Ok(decks) => {
                    if !decks.is_empty() {
                        debug!("Adding {} decks from {}", decks.len(), day);
                        inserted += self.store.insert_decks(decks).await?;
                    }
                }
                Err(e) if e.is_transient() => {
                    debug!("No decks published on {}", day);
                }
                Err(e) => return Err(e.into()),
            }
            day = day + Days::new(1);
        }

        Ok(inserted)
    }

    async fn refresh_card_values(&self, index: &CardIndex) -> Result<(), SyncError> {
        info!("Recomputing base card values");
        let decks = self.store.all_decks().await?;
        let heroes = self.store.all_heroes().await?;
        let values = calculate::compute_card_values(index.canonical_cards(), &decks, &heroes)?;
        self.store.replace_card_values(values).await?;
        Ok(())
    }

    async fn refresh_pack_values(&self) -> Result<(), SyncError> {
        info!("Recomputing base pack values");

        let values_by_code: HashMap<_, _> = self
            .store
            .all_card_values()
            .await?
            .into_iter()
            .map(|cv| (cv.code.clone(), cv))
            .collect();

        let mut pack_values = Vec::new();
        for pack in self.store.all_packs().await? {
            let cards = self.store.player_cards_in_pack(&pack.code).await?;
            if cards.is_empty() {
                // Scenario packs carry no player cards and get no value.
                continue;
            }

            let mut card_values: Vec<_> = cards
                .iter()
                .filter_map(|card| values_by_code.get(&card.code).cloned())
                .collect();
            card_values.sort_by(|a, b| b.value.cmp(&a.value));
            pack_values.push(PackValue::new(pack, card_values));
        }

        pack_values.sort_by(|a, b| b.value_sum.cmp(&a.value_sum));
        self.store.replace_pack_values(pack_values).await?;
        Ok(())
    }
}
