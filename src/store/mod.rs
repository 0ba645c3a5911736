//! Document-store seam.
//!
//! The valuator treats its store as an abstract keyed document store:
//! insert-many-ignore-duplicates, find-all, latest-by-date, replace-by-key,
//! and a create-if-absent freshness record. [`MemoryStore`] is the
//! in-process implementation used by the server and tests; anything that
//! can satisfy [`CatalogStore`] can be swapped in.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Card, CardValue, Decklist, Hero, Pack, PackValue, SyncMeta};

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Typed access to the valuator's collections.
///
/// All read methods return owned copies; callers may freely mutate the
/// results for request-scoped adjustment without touching stored state.
/// Writes are only ever performed by the sync controller.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cheap connectivity check, run before a refresh touches the network.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn replace_packs(&self, packs: Vec<Pack>) -> Result<(), StoreError>;
    async fn all_packs(&self) -> Result<Vec<Pack>, StoreError>;

    async fn replace_cards(&self, cards: Vec<Card>) -> Result<(), StoreError>;
    async fn all_cards(&self) -> Result<Vec<Card>, StoreError>;

    /// Player cards (aspect within [`crate::models::PLAYER_ASPECTS`])
    /// appearing in the given pack, counting reprints.
    async fn player_cards_in_pack(&self, pack_code: &str) -> Result<Vec<Card>, StoreError>;

    async fn replace_heroes(&self, heroes: Vec<Hero>) -> Result<(), StoreError>;
    async fn all_heroes(&self) -> Result<Vec<Hero>, StoreError>;

    /// Insert decklists, silently skipping ids already present.
    /// Returns the number actually inserted.
    async fn insert_decks(&self, decks: Vec<Decklist>) -> Result<u64, StoreError>;

    /// The stored deck with the most recent creation timestamp.
    async fn latest_deck(&self) -> Result<Option<Decklist>, StoreError>;
    async fn all_decks(&self) -> Result<Vec<Decklist>, StoreError>;

    async fn replace_card_values(&self, values: Vec<CardValue>) -> Result<(), StoreError>;
    async fn all_card_values(&self) -> Result<Vec<CardValue>, StoreError>;

    async fn replace_pack_values(&self, values: Vec<PackValue>) -> Result<(), StoreError>;
    async fn all_pack_values(&self) -> Result<Vec<PackValue>, StoreError>;

    /// Create the freshness record with the never-synced sentinel if it
    /// does not exist yet. Idempotent.
    async fn ensure_meta(&self) -> Result<(), StoreError>;
    async fn get_meta(&self) -> Result<SyncMeta, StoreError>;
    async fn set_meta(&self, meta: SyncMeta) -> Result<(), StoreError>;

    /// Drop all derived and cached collections. Used by the startup
    /// reset knob; the freshness record reverts to the sentinel.
    async fn clear(&self) -> Result<(), StoreError>;
}
