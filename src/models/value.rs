//! Derived value records and the scoring formula.

use serde::{Deserialize, Serialize};

use super::{Card, Pack};

/// Derived value of a single card.
///
/// Counters are filled by a full pass over all stored decks; the
/// adjustment counters and `new_mod` are overridden per request. Any
/// change to a counter or modifier must be followed by [`CardValue::calculate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardValue {
    /// Canonical card code, unique key.
    pub code: String,

    /// The card this value describes.
    pub card: Card,

    /// Decks that could legally have included this card.
    pub eligible_decks_count: u32,

    /// Decks actually running this card or one of its reprints.
    pub in_decks_count: u32,

    /// Heroes carrying at least one of the card's locking traits.
    /// Zero for cards without locking traits.
    pub eligible_hero_count: u32,

    /// Of those, heroes the caller owns (or that ship in the pack under
    /// valuation).
    pub owned_hero_count: u32,

    /// 1 if the caller does not own the card, 0 if they do.
    pub new_mod: f64,

    /// Derived: 1 + in-deck share of eligible decks.
    pub popularity_mod: f64,

    /// Derived: owned share of trait-eligible heroes, 1 when not trait-locked.
    pub trait_mod: f64,

    /// Caller-supplied aspect weight. Carried in responses for clients to
    /// apply their own weighting; not part of the value formula.
    pub weight_mod: f64,

    /// Final integer value.
    pub value: i64,
}

impl CardValue {
    /// Base value record for a card: all counters zero, modifiers neutral.
    pub fn new(card: Card) -> Self {
        let mut cv = Self {
            code: card.code.clone(),
            card,
            eligible_decks_count: 0,
            in_decks_count: 0,
            eligible_hero_count: 0,
            owned_hero_count: 0,
            new_mod: 1.0,
            popularity_mod: 1.0,
            trait_mod: 1.0,
            weight_mod: 1.0,
            value: 0,
        };
        cv.calculate();
        cv
    }

    /// Recompute the derived modifiers and the final value from the
    /// current counters. Deterministic in the struct's own fields.
    pub fn calculate(&mut self) {
        self.popularity_mod = 1.0;
        if self.eligible_decks_count > 0 {
            self.popularity_mod +=
                f64::from(self.in_decks_count) / f64::from(self.eligible_decks_count);
        }

        self.trait_mod = 1.0;
        if !self.card.locking_traits.is_empty() && self.eligible_hero_count > 0 {
            self.trait_mod =
                f64::from(self.owned_hero_count) / f64::from(self.eligible_hero_count);
        }

        self.value =
            (100.0 * self.new_mod * self.popularity_mod * self.trait_mod).round() as i64;
    }
}

/// Derived value of a pack: its player cards' values and their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackValue {
    /// Pack code, unique key.
    pub code: String,

    /// The pack this value describes.
    pub pack: Pack,

    /// Values of the pack's player cards, sorted descending by value.
    pub card_values: Vec<CardValue>,

    /// Integer sum of the contained card values.
    pub value_sum: i64,
}

impl PackValue {
    pub fn new(pack: Pack, card_values: Vec<CardValue>) -> Self {
        let mut pv = Self {
            code: pack.code.clone(),
            pack,
            card_values,
            value_sum: 0,
        };
        pv.calculate();
        pv
    }

    /// Recompute the sum after any change to the contained card values.
    pub fn calculate(&mut self) {
        self.value_sum = self.card_values.iter().map(|cv| cv.value).sum();
    }
}
