//! Valuation engine.
//!
//! Pure functions over stored data:
//! - deck eligibility and in-use checks for a card
//! - the base card-value pass over all decks
//! - per-request ownership/weight adjustment

use std::collections::{HashMap, HashSet};

use chrono::NaiveTime;
use thiserror::Error;

use crate::models::{hero_key, Card, CardValue, Decklist, Hero};

/// Errors from the base value pass.
#[derive(Debug, Error)]
pub enum CalculateError {
    /// A stored decklist references a hero no stored hero matches.
    /// Upstream data is inconsistent; the refresh aborts.
    #[error("no hero matches decklist hero code {0}")]
    UnknownDeckHero(String),
}

/// Whether `deck` is a valid data point for `card`'s popularity.
///
/// A deck counts only if it was updated after the card became available,
/// shares the card's aspect (or the card is basic), and, for trait-locked
/// cards, is built around a hero carrying one of the locking traits.
pub fn is_card_eligible(card: &Card, deck: &Decklist, hero: &Hero) -> bool {
    let available = card
        .date_available
        .and_time(NaiveTime::MIN)
        .and_utc();
    if deck.date_updated() < available {
        return false;
    }

    if card.aspect != "basic" && !deck.aspects().iter().any(|a| a == &card.aspect) {
        return false;
    }

    if !card.locking_traits.is_empty() {
        return card
            .locking_traits
            .iter()
            .any(|trait_name| hero.has_trait(trait_name));
    }

    true
}

/// Whether `deck` actually runs `card`, under its own code or any of its
/// reprint codes.
pub fn deck_uses_card(card: &Card, deck: &Decklist) -> bool {
    std::iter::once(&card.code)
        .chain(card.duplicate_by.iter())
        .any(|code| deck.slots.get(code).is_some_and(|count| *count > 0))
}

/// Full base pass: count eligible and in-use decks for every card and
/// compute its value. Output is sorted descending by value.
pub fn compute_card_values(
    cards: Vec<Card>,
    decks: &[Decklist],
    heroes: &[Hero],
) -> Result<Vec<CardValue>, CalculateError> {
    let heroes_by_key: HashMap<&str, &Hero> = heroes
        .iter()
        .map(|hero| (hero_key(&hero.code), hero))
        .collect();

    let mut values = Vec::with_capacity(cards.len());
    for card in cards {
        let mut cv = CardValue::new(card);

        for deck in decks {
            let hero = heroes_by_key
                .get(hero_key(&deck.hero_code))
                .ok_or_else(|| CalculateError::UnknownDeckHero(deck.hero_code.clone()))?;

            if is_card_eligible(&cv.card, deck, hero) {
                cv.eligible_decks_count += 1;
                if deck_uses_card(&cv.card, deck) {
                    cv.in_decks_count += 1;
                }
            }
        }

        cv.calculate();
        values.push(cv);
    }

    values.sort_by(|a, b| b.value.cmp(&a.value));
    Ok(values)
}

/// Per-request adjustment of one base card value.
///
/// Ownership zeroes `new_mod`; the caller's aspect weights land in
/// `weight_mod` (carried, not multiplied in); trait-locked cards get their
/// hero counters recomputed from current ownership. `pack_code` names the
/// pack under valuation, whose own heroes count as owned, since buying
/// the pack brings them along.
pub fn adjust_card_value(
    cv: &mut CardValue,
    owned_cards: &HashSet<String>,
    owned_hero_codes: &HashSet<String>,
    all_heroes: &[Hero],
    pack_code: Option<&str>,
    aspect_weights: &HashMap<String, f64>,
) {
    if owned_cards.contains(&cv.code) {
        cv.new_mod = 0.0;
    }

    if let Some(weight) = aspect_weights.get(&cv.card.aspect) {
        cv.weight_mod = *weight;
    }

    if !cv.card.locking_traits.is_empty() {
        let traited: Vec<&Hero> = all_heroes
            .iter()
            .filter(|hero| {
                cv.card
                    .locking_traits
                    .iter()
                    .any(|trait_name| hero.has_trait(trait_name))
            })
            .collect();

        cv.eligible_hero_count = traited.len() as u32;
        cv.owned_hero_count = traited
            .iter()
            .filter(|hero| {
                owned_hero_codes.contains(&hero.code)
                    || pack_code.is_some_and(|code| code == hero.pack_code)
            })
            .count() as u32;
    }

    cv.calculate();
}
