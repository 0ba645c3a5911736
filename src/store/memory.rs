//! In-memory document store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CatalogStore, StoreError};
use crate::models::{
    Card, CardValue, Decklist, Hero, Pack, PackValue, SyncMeta, PLAYER_ASPECTS,
};

#[derive(Default)]
struct Collections {
    packs: Vec<Pack>,
    cards: Vec<Card>,
    heroes: Vec<Hero>,
    decks: HashMap<i64, Decklist>,
    card_values: Vec<CardValue>,
    pack_values: Vec<PackValue>,
    meta: Option<SyncMeta>,
}

/// [`CatalogStore`] backed by process memory.
///
/// Reads clone, writes replace; the lock is held only for the copy, so a
/// long refresh never blocks readers of already-cached data.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn replace_packs(&self, packs: Vec<Pack>) -> Result<(), StoreError> {
        self.inner.write().await.packs = packs;
        Ok(())
    }

    async fn all_packs(&self) -> Result<Vec<Pack>, StoreError> {
        Ok(self.inner.read().await.packs.clone())
    }

    async fn replace_cards(&self, cards: Vec<Card>) -> Result<(), StoreError> {
        self.inner.write().await.cards = cards;
        Ok(())
    }

    async fn all_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.inner.read().await.cards.clone())
    }

    async fn player_cards_in_pack(&self, pack_code: &str) -> Result<Vec<Card>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .cards
            .iter()
            .filter(|card| {
                card.pack_codes.iter().any(|code| code == pack_code)
                    && PLAYER_ASPECTS.contains(&card.aspect.as_str())
            })
            .cloned()
            .collect())
    }

    async fn replace_heroes(&self, heroes: Vec<Hero>) -> Result<(), StoreError> {
        self.inner.write().await.heroes = heroes;
        Ok(())
    }

    async fn all_heroes(&self) -> Result<Vec<Hero>, StoreError> {
        Ok(self.inner.read().await.heroes.clone())
    }

    async fn insert_decks(&self, decks: Vec<Decklist>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut inserted = 0u64;
        for deck in decks {
            if let std::collections::hash_map::Entry::Vacant(slot) = inner.decks.entry(deck.id) {
                slot.insert(deck);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn latest_deck(&self) -> Result<Option<Decklist>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .decks
            .values()
            .max_by_key(|deck| deck.date_created())
            .cloned())
    }

    async fn all_decks(&self) -> Result<Vec<Decklist>, StoreError> {
        let inner = self.inner.read().await;
        let mut decks: Vec<Decklist> = inner.decks.values().cloned().collect();
        decks.sort_by_key(|deck| deck.id);
        Ok(decks)
    }

    async fn replace_card_values(&self, values: Vec<CardValue>) -> Result<(), StoreError> {
        self.inner.write().await.card_values = values;
        Ok(())
    }

    async fn all_card_values(&self) -> Result<Vec<CardValue>, StoreError> {
        Ok(self.inner.read().await.card_values.clone())
    }

    async fn replace_pack_values(&self, values: Vec<PackValue>) -> Result<(), StoreError> {
        self.inner.write().await.pack_values = values;
        Ok(())
    }

    async fn all_pack_values(&self) -> Result<Vec<PackValue>, StoreError> {
        Ok(self.inner.read().await.pack_values.clone())
    }

    async fn ensure_meta(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.meta.get_or_insert_with(SyncMeta::unsynced);
        Ok(())
    }

    async fn get_meta(&self) -> Result<SyncMeta, StoreError> {
        let inner = self.inner.read().await;
        inner
            .meta
            .ok_or_else(|| StoreError::Unavailable("meta record missing".to_string()))
    }

    async fn set_meta(&self, meta: SyncMeta) -> Result<(), StoreError> {
        self.inner.write().await.meta = Some(meta);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        *inner = Collections::default();
        Ok(())
    }
}
