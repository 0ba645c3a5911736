//! The valuation service.
//!
//! An explicitly constructed service object owning the store and the sync
//! controller; request handlers receive it injected rather than reaching
//! for process-wide state. Every public operation runs the freshness gate
//! first, then reads base records and personalizes request-scoped copies.
//! Stored values are never mutated in place, so concurrent callers with
//! different collections cannot observe each other's adjustments.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::calculate;
use crate::models::{CardValue, Hero, Pack, PackValue};
use crate::store::{CatalogStore, StoreError};
use crate::sync::{SyncConfig, SyncController, SyncError};
use crate::upstream::CatalogProvider;

/// Errors surfaced to the transport layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The valuation service.
pub struct Valuator {
    store: Arc<dyn CatalogStore>,
    sync: Arc<SyncController>,
}

impl Valuator {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        upstream: Arc<dyn CatalogProvider>,
        config: SyncConfig,
    ) -> Self {
        let sync = Arc::new(SyncController::new(store.clone(), upstream, config));
        Self { store, sync }
    }

    /// Run one full refresh immediately, regardless of freshness.
    pub async fn sync_now(&self) -> Result<(), ServiceError> {
        self.sync.refresh_all().await.map_err(Into::into)
    }

    /// Await a background refresh spawned by the freshness gate. Test
    /// hook; see [`SyncController::wait_for_background`].
    pub async fn wait_for_background_refresh(&self) {
        self.sync.wait_for_background().await;
    }

    /// All known packs, sorted by availability date ascending.
    pub async fn get_packs(&self) -> Result<Vec<Pack>, ServiceError> {
        self.sync.ensure_fresh().await?;

        let mut packs = self.store.all_packs().await?;
        packs.sort_by(|a, b| {
            a.date_available()
                .cmp(&b.date_available())
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(packs)
    }

    /// Base card values personalized for the caller's collection, sorted
    /// descending by value.
    pub async fn value_all_cards(
        &self,
        owned_packs: &[String],
    ) -> Result<Vec<CardValue>, ServiceError> {
        self.sync.ensure_fresh().await?;

        let mut values = self.store.all_card_values().await?;
        let ownership = self.ownership(owned_packs).await?;

        for cv in &mut values {
            calculate::adjust_card_value(
                cv,
                &ownership.cards,
                &ownership.heroes,
                &ownership.all_heroes,
                None,
                &HashMap::new(),
            );
        }

        values.sort_by(|a, b| b.value.cmp(&a.value));
        Ok(values)
    }

    /// Base pack values personalized for the caller's collection and
    /// aspect weights, sorted descending by value sum.
    pub async fn value_all_packs(
        &self,
        owned_packs: &[String],
        aspect_weights: &HashMap<String, f64>,
    ) -> Result<Vec<PackValue>, ServiceError> {
        self.sync.ensure_fresh().await?;

        let mut pack_values = self.store.all_pack_values().await?;
        let ownership = self.ownership(owned_packs).await?;

        for pv in &mut pack_values {
            let pack_code = pv.code.clone();
            for cv in &mut pv.card_values {
                calculate::adjust_card_value(
                    cv,
                    &ownership.cards,
                    &ownership.heroes,
                    &ownership.all_heroes,
                    Some(&pack_code),
                    aspect_weights,
                );
            }
            pv.card_values.sort_by(|a, b| b.value.cmp(&a.value));
            pv.calculate();
        }

        pack_values.sort_by(|a, b| b.value_sum.cmp(&a.value_sum));
        Ok(pack_values)
    }

    async fn ownership(&self, owned_packs: &[String]) -> Result<Ownership, ServiceError> {
        let mut cards = HashSet::new();
        for pack_code in owned_packs {
            for card in self.store.player_cards_in_pack(pack_code).await? {
                cards.insert(card.code);
            }
        }

        let all_heroes = self.store.all_heroes().await?;
        let heroes = all_heroes
            .iter()
            .filter(|hero| owned_packs.contains(&hero.pack_code))
            .map(|hero| hero.code.clone())
            .collect();

        Ok(Ownership {
            cards,
            heroes,
            all_heroes,
        })
    }
}

/// The caller's collection resolved to card and hero ownership.
struct Ownership {
    cards: HashSet<String>,
    heroes: HashSet<String>,
    all_heroes: Vec<Hero>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, Decklist, SyncMeta};
    use crate::store::MemoryStore;
    use crate::upstream::{RawCard, RawPack, UpstreamError};
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};

    /// The serving-path tests preload the store and stamp it fresh, so
    /// the provider must never be reached.
    struct UnreachableProvider;

    #[async_trait]
    impl CatalogProvider for UnreachableProvider {
        async fn all_packs(&self) -> Result<Vec<RawPack>, UpstreamError> {
            panic!("provider must not be called while data is fresh");
        }

        async fn all_cards(&self) -> Result<Vec<RawCard>, UpstreamError> {
            panic!("provider must not be called while data is fresh");
        }

        async fn decklists_by_date(
            &self,
            _date: NaiveDate,
        ) -> Result<Vec<Decklist>, UpstreamError> {
            panic!("provider must not be called while data is fresh");
        }
    }

    fn pack(code: &str, available: &str) -> Pack {
        Pack {
            code: code.to_string(),
            name: code.to_string(),
            id: 1,
            available: available.to_string(),
        }
    }

    fn card(code: &str, aspect: &str, pack: &str, locks: &[&str]) -> Card {
        Card {
            code: code.to_string(),
            name: code.to_string(),
            subname: String::new(),
            pack_codes: vec![pack.to_string()],
            type_code: "ally".to_string(),
            aspect: aspect.to_string(),
            traits: vec![],
            locking_traits: locks.iter().map(|t| t.to_string()).collect(),
            date_available: NaiveDate::from_ymd_opt(2019, 10, 18).unwrap(),
            duplicate_by: vec![],
            text: String::new(),
            card_set_name: String::new(),
            linked_card_code: None,
        }
    }

    fn base_value(card: Card, eligible: u32, in_decks: u32) -> CardValue {
        let mut cv = CardValue::new(card);
        cv.eligible_decks_count = eligible;
        cv.in_decks_count = in_decks;
        cv.calculate();
        cv
    }

    async fn fresh_valuator() -> (Valuator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());

        store
            .replace_packs(vec![pack("core", "2019-10-18"), pack("guards", "2020-08-13")])
            .await
            .unwrap();
        store
            .replace_cards(vec![
                card("01052", "aggression", "core", &[]),
                card("02010", "justice", "guards", &["Guardian"]),
            ])
            .await
            .unwrap();
        store
            .replace_heroes(vec![
                Hero {
                    code: "02001a".to_string(),
                    pack_code: "guards".to_string(),
                    name: "Groot".to_string(),
                    traits: vec!["Guardian".to_string()],
                },
                Hero {
                    code: "01001a".to_string(),
                    pack_code: "core".to_string(),
                    name: "Spider-Man".to_string(),
                    traits: vec!["Avenger".to_string()],
                },
            ])
            .await
            .unwrap();

        let core_value = base_value(card("01052", "aggression", "core", &[]), 4, 2);
        let guards_value = base_value(card("02010", "justice", "guards", &["Guardian"]), 0, 0);
        store
            .replace_card_values(vec![core_value.clone(), guards_value.clone()])
            .await
            .unwrap();
        store
            .replace_pack_values(vec![
                PackValue::new(pack("core", "2019-10-18"), vec![core_value]),
                PackValue::new(pack("guards", "2020-08-13"), vec![guards_value]),
            ])
            .await
            .unwrap();

        store.ensure_meta().await.unwrap();
        store
            .set_meta(SyncMeta {
                last_updated: Utc::now(),
            })
            .await
            .unwrap();

        let valuator = Valuator::new(
            store.clone(),
            Arc::new(UnreachableProvider),
            SyncConfig::default(),
        );
        (valuator, store)
    }

    #[tokio::test]
    async fn test_get_packs_sorted_by_availability() {
        let (valuator, _store) = fresh_valuator().await;
        let packs = valuator.get_packs().await.unwrap();
        let codes: Vec<&str> = packs.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["core", "guards"]);
    }

    #[tokio::test]
    async fn test_value_all_cards_unowned() {
        let (valuator, _store) = fresh_valuator().await;
        let values = valuator.value_all_cards(&[]).await.unwrap();

        assert_eq!(values[0].code, "01052");
        assert_eq!(values[0].value, 150);
        assert_eq!(values[0].new_mod, 1.0);
    }

    #[tokio::test]
    async fn test_value_all_cards_owned_pack_zeroes_cards() {
        let (valuator, _store) = fresh_valuator().await;
        let values = valuator
            .value_all_cards(&["core".to_string()])
            .await
            .unwrap();

        let owned = values.iter().find(|cv| cv.code == "01052").unwrap();
        assert_eq!(owned.new_mod, 0.0);
        assert_eq!(owned.value, 0);
    }

    #[tokio::test]
    async fn test_personalization_does_not_leak_between_requests() {
        let (valuator, store) = fresh_valuator().await;

        valuator
            .value_all_cards(&["core".to_string()])
            .await
            .unwrap();

        // Stored base values are untouched by the personalized request.
        let base = store.all_card_values().await.unwrap();
        let stored = base.iter().find(|cv| cv.code == "01052").unwrap();
        assert_eq!(stored.new_mod, 1.0);
        assert_eq!(stored.value, 150);

        let fresh = valuator.value_all_cards(&[]).await.unwrap();
        let cv = fresh.iter().find(|cv| cv.code == "01052").unwrap();
        assert_eq!(cv.value, 150);
    }

    #[tokio::test]
    async fn test_value_all_packs_ownership_and_sum() {
        let (valuator, _store) = fresh_valuator().await;
        let packs = valuator
            .value_all_packs(&["core".to_string()], &HashMap::new())
            .await
            .unwrap();

        for pv in &packs {
            let sum: i64 = pv.card_values.iter().map(|cv| cv.value).sum();
            assert_eq!(pv.value_sum, sum);
        }

        let core = packs.iter().find(|pv| pv.code == "core").unwrap();
        assert_eq!(core.value_sum, 0);
    }

    #[tokio::test]
    async fn test_value_all_packs_trait_counts_use_hero_ownership() {
        let (valuator, _store) = fresh_valuator().await;
        let packs = valuator
            .value_all_packs(&[], &HashMap::new())
            .await
            .unwrap();

        // The Guardian-locked card sees one traited hero, owned only
        // through the pack being valued.
        let guards = packs.iter().find(|pv| pv.code == "guards").unwrap();
        let locked = &guards.card_values[0];
        assert_eq!(locked.eligible_hero_count, 1);
        assert_eq!(locked.owned_hero_count, 1);
        assert_eq!(locked.value, 100);
    }

    #[tokio::test]
    async fn test_value_all_packs_sorted_by_sum_descending() {
        let (valuator, _store) = fresh_valuator().await;
        let packs = valuator
            .value_all_packs(&[], &HashMap::new())
            .await
            .unwrap();

        let sums: Vec<i64> = packs.iter().map(|pv| pv.value_sum).collect();
        let mut sorted = sums.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sums, sorted);
    }

    #[tokio::test]
    async fn test_aspect_weights_carried_but_not_applied() {
        let (valuator, _store) = fresh_valuator().await;
        let weights: HashMap<String, f64> =
            [("aggression".to_string(), 2.0)].into_iter().collect();
        let packs = valuator.value_all_packs(&[], &weights).await.unwrap();

        let core = packs.iter().find(|pv| pv.code == "core").unwrap();
        let cv = &core.card_values[0];
        assert_eq!(cv.weight_mod, 2.0);
        assert_eq!(cv.value, 150);
    }
}
