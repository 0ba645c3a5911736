//! Canonical card model and the duplicate-alias index.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A canonical player/hero card.
///
/// A card reprinted in several packs exists once; `pack_codes` accumulates
/// every pack it appears in and `duplicate_by` records the codes of its
/// reprints. Lookups by a reprint code resolve through [`CardIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Canonical card code, unique key.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Display subname (often empty).
    pub subname: String,

    /// Every pack this card (or a reprint of it) appears in.
    pub pack_codes: Vec<String>,

    /// Card type, e.g. "ally", "event", "hero".
    pub type_code: String,

    /// Owning aspect, e.g. "aggression" or "basic"; "hero" for identity cards.
    pub aspect: String,

    /// Printed trait line, split and trimmed.
    pub traits: Vec<String>,

    /// Traits the controlling hero must possess for this card to be played,
    /// parsed from rules text.
    pub locking_traits: Vec<String>,

    /// Release date of the originating pack.
    pub date_available: NaiveDate,

    /// Codes of reprints that alias this card.
    pub duplicate_by: Vec<String>,

    /// Rules text.
    pub text: String,

    /// Name of the card set this card belongs to (hero kits share their
    /// hero's name here).
    pub card_set_name: String,

    /// Code of a linked card (e.g. a hero's alter-ego side).
    pub linked_card_code: Option<String>,
}

/// Canonical card arena plus an alias table for duplicate codes.
///
/// Canonical cards live in one map keyed by their own code; every reprint
/// code maps to its canonical code in a separate table. Resolution checks
/// the canonical arena first, then follows one alias hop. Mutation only
/// ever happens through the canonical entry.
#[derive(Debug, Clone, Default)]
pub struct CardIndex {
    canonical: HashMap<String, Card>,
    aliases: HashMap<String, String>,
}

impl CardIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of canonical cards.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Insert a canonical card keyed by its own code.
    pub fn insert(&mut self, card: Card) {
        self.canonical.insert(card.code.clone(), card);
    }

    /// Register `alias` as a duplicate code resolving to `canonical`.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        self.aliases.insert(alias.to_string(), canonical.to_string());
    }

    /// Resolve any code (canonical or alias) to its canonical card.
    pub fn resolve(&self, code: &str) -> Option<&Card> {
        if let Some(card) = self.canonical.get(code) {
            return Some(card);
        }
        self.aliases
            .get(code)
            .and_then(|canonical| self.canonical.get(canonical))
    }

    /// Mutable access to a canonical card by its canonical code only.
    /// Aliases are deliberately not followed here; duplicate handling
    /// resolves the canonical code first and mutates exactly once.
    pub fn get_mut(&mut self, canonical_code: &str) -> Option<&mut Card> {
        self.canonical.get_mut(canonical_code)
    }

    /// All canonical cards, sorted by code for deterministic output.
    pub fn canonical_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self.canonical.values().cloned().collect();
        cards.sort_by(|a, b| a.code.cmp(&b.code));
        cards
    }
}
