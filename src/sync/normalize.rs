//! Catalog normalizer.
//!
//! Converts raw upstream records into the canonical local entities:
//! duplicate cards collapse into one canonical card plus an alias table,
//! hero printings merge into one hero per (name, pack), and rules text is
//! mined for locking and granted traits.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::models::{Card, CardIndex, Hero, Pack};
use crate::upstream::RawCard;

/// Referential-integrity failures during normalization. Upstream data is
/// inconsistent or arrived out of order; the refresh run aborts.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("duplicate card {duplicate} points at unknown original {original}")]
    MissingOriginal { duplicate: String, original: String },

    #[error("card {card} belongs to unknown pack {pack}")]
    MissingPack { card: String, pack: String },

    #[error("hero card {hero} links to unknown card {linked}")]
    MissingLinkedCard { hero: String, linked: String },
}

/// Build the canonical card set from raw upstream records.
///
/// Non-duplicate records are materialized first; duplicates are then
/// folded into their originals (pack code and alias recorded) and
/// registered in the alias table. Duplicate handling mutates the
/// canonical entry exactly once per duplicate.
pub fn normalize_cards(
    raw_cards: Vec<RawCard>,
    packs: &HashMap<String, Pack>,
) -> Result<CardIndex, NormalizeError> {
    let mut index = CardIndex::new();
    let mut duplicates = Vec::new();

    for raw in raw_cards {
        if raw.duplicate_of.is_some() {
            duplicates.push(raw);
            continue;
        }

        let pack = packs.get(&raw.pack_code).ok_or_else(|| NormalizeError::MissingPack {
            card: raw.code.clone(),
            pack: raw.pack_code.clone(),
        })?;

        index.insert(Card {
            code: raw.code.clone(),
            name: raw.name,
            subname: raw.subname,
            pack_codes: vec![raw.pack_code],
            type_code: raw.type_code,
            aspect: raw.faction_code,
            traits: split_traits(&raw.traits),
            locking_traits: parse_locking_traits(&raw.text),
            date_available: pack.date_available(),
            duplicate_by: vec![],
            text: raw.text,
            card_set_name: raw.card_set_name,
            linked_card_code: raw.linked_card.map(|linked| linked.code),
        });
    }

    for dup in duplicates {
        let original = dup.duplicate_of.clone().unwrap_or_default();
        let canonical_code = index
            .resolve(&original)
            .map(|card| card.code.clone())
            .ok_or_else(|| NormalizeError::MissingOriginal {
                duplicate: dup.code.clone(),
                original: original.clone(),
            })?;

        let card = index
            .get_mut(&canonical_code)
            .expect("resolved canonical code is present");
        card.pack_codes.push(dup.pack_code.clone());
        card.duplicate_by.push(dup.code.clone());
        index.add_alias(&dup.code, &canonical_code);
    }

    Ok(index)
}

/// Assemble heroes from the canonical card set.
///
/// Hero identity cards contribute their traits plus their linked
/// alter-ego's; printings sharing (name, pack) merge. Cards in a hero's
/// own card set can grant extra traits via "gains the X trait" text.
pub fn build_heroes(index: &CardIndex) -> Result<Vec<Hero>, NormalizeError> {
    let cards = index.canonical_cards();

    let mut raw_heroes = Vec::new();
    for card in cards.iter().filter(|c| c.aspect == "hero" && c.type_code == "hero") {
        let mut hero = Hero {
            code: card.code.clone(),
            pack_code: card.pack_codes[0].clone(),
            name: card.name.clone(),
            traits: card.traits.clone(),
        };

        if let Some(linked_code) = &card.linked_card_code {
            let linked =
                index
                    .resolve(linked_code)
                    .ok_or_else(|| NormalizeError::MissingLinkedCard {
                        hero: card.code.clone(),
                        linked: linked_code.clone(),
                    })?;
            let linked_side = Hero {
                code: linked.code.clone(),
                pack_code: hero.pack_code.clone(),
                name: hero.name.clone(),
                traits: linked.traits.clone(),
            };
            hero.merge(&linked_side);
        }

        raw_heroes.push(hero);
    }

    // Printings of the same hero in the same pack collapse into one.
    let mut merged: HashMap<(String, String), Hero> = HashMap::new();
    for hero in raw_heroes {
        let key = (hero.name.clone(), hero.pack_code.clone());
        match merged.get_mut(&key) {
            Some(existing) => existing.merge(&hero),
            None => {
                merged.insert(key, hero);
            }
        }
    }

    let mut heroes: Vec<Hero> = merged.into_values().collect();
    for hero in &mut heroes {
        for card in cards.iter().filter(|c| c.card_set_name == hero.name) {
            if let Some(granted) = parse_granted_trait(&card.text) {
                hero.traits.push(granted);
            }
        }
        hero.sanitize_traits();
    }

    heroes.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(heroes)
}

/// Split the upstream `". "`-separated trait line.
pub fn split_traits(raw: &str) -> Vec<String> {
    raw.split(". ")
        .map(|part| part.trim().trim_end_matches('.').to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Traits the controlling hero must possess for the card to be played,
/// parsed from rules text. Three phrasings, first match wins.
pub fn parse_locking_traits(text: &str) -> Vec<String> {
    // "Play only if your identity has the A or B trait."
    let two = Regex::new(r"Play only if your identity has the (.+) or (.+) trait")
        .expect("valid regex");
    if let Some(captures) = two.captures(text) {
        return vec![trim_trait(&captures[1]), trim_trait(&captures[2])];
    }

    // "Play only if your identity has the T trait."
    let identity =
        Regex::new(r"Play only if your identity has the (.+) trait").expect("valid regex");
    if let Some(captures) = identity.captures(text) {
        return vec![trim_trait(&captures[1])];
    }

    // "Play only if you have the T trait."
    let you = Regex::new(r"Play only if you have the (.+) trait").expect("valid regex");
    if let Some(captures) = you.captures(text) {
        return vec![trim_trait(&captures[1])];
    }

    Vec::new()
}

/// A trait granted to the owning hero by a card in their set, e.g.
/// "gains the Avenger trait".
pub fn parse_granted_trait(text: &str) -> Option<String> {
    let gains = Regex::new(r"gains? the (.+) trait").expect("valid regex");
    gains.captures(text).map(|captures| trim_trait(&captures[1]))
}

fn trim_trait(raw: &str) -> String {
    raw.trim_matches(|c| c == '[' || c == ']' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::RawLinkedCard;
    use pretty_assertions::assert_eq;

    fn pack(code: &str, available: &str) -> Pack {
        Pack {
            code: code.to_string(),
            name: code.to_string(),
            id: 1,
            available: available.to_string(),
        }
    }

    fn pack_map(codes: &[&str]) -> HashMap<String, Pack> {
        codes
            .iter()
            .map(|code| (code.to_string(), pack(code, "2019-10-18")))
            .collect()
    }

    fn raw(code: &str, pack_code: &str) -> RawCard {
        RawCard {
            code: code.to_string(),
            name: format!("Card {}", code),
            subname: String::new(),
            pack_code: pack_code.to_string(),
            type_code: "ally".to_string(),
            faction_code: "justice".to_string(),
            traits: String::new(),
            duplicate_of: None,
            text: String::new(),
            card_set_name: String::new(),
            linked_card: None,
        }
    }

    #[test]
    fn test_split_traits() {
        assert_eq!(
            split_traits("Avenger. S.H.I.E.L.D."),
            vec!["Avenger", "S.H.I.E.L.D"]
        );
        assert!(split_traits("").is_empty());
    }

    #[test]
    fn test_parse_locking_traits_two_trait_form() {
        let text = "Play only if your identity has the [[Avenger]] or [[Defender]] trait.";
        assert_eq!(parse_locking_traits(text), vec!["Avenger", "Defender"]);
    }

    #[test]
    fn test_parse_locking_traits_identity_form() {
        let text = "Play only if your identity has the [[Aerial]] trait.";
        assert_eq!(parse_locking_traits(text), vec!["Aerial"]);
    }

    #[test]
    fn test_parse_locking_traits_you_form() {
        let text = "Play only if you have the Spider trait.";
        assert_eq!(parse_locking_traits(text), vec!["Spider"]);
    }

    #[test]
    fn test_parse_locking_traits_no_match() {
        assert!(parse_locking_traits("Draw a card.").is_empty());
    }

    #[test]
    fn test_parse_granted_trait() {
        assert_eq!(
            parse_granted_trait("Your hero gains the [[Avenger]] trait."),
            Some("Avenger".to_string())
        );
        assert_eq!(
            parse_granted_trait("You gain the Champion trait."),
            Some("Champion".to_string())
        );
        assert_eq!(parse_granted_trait("Draw a card."), None);
    }

    #[test]
    fn test_normalize_cards_folds_duplicates() {
        let packs = pack_map(&["core", "reprint"]);
        let original = raw("01001", "core");
        let mut duplicate = raw("02001", "reprint");
        duplicate.duplicate_of = Some("01001".to_string());

        let index = normalize_cards(vec![original, duplicate], &packs).unwrap();

        assert_eq!(index.len(), 1);
        let canonical = index.resolve("01001").unwrap();
        assert_eq!(canonical.pack_codes, vec!["core", "reprint"]);
        assert_eq!(canonical.duplicate_by, vec!["02001"]);

        let via_alias = index.resolve("02001").unwrap();
        assert_eq!(via_alias.code, "01001");
    }

    #[test]
    fn test_normalize_cards_missing_original_is_fatal() {
        let packs = pack_map(&["core"]);
        let mut duplicate = raw("02001", "core");
        duplicate.duplicate_of = Some("01001".to_string());

        let err = normalize_cards(vec![duplicate], &packs).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingOriginal { .. }));
    }

    #[test]
    fn test_normalize_cards_missing_pack_is_fatal() {
        let packs = pack_map(&["core"]);
        let card = raw("01001", "unknown_pack");

        let err = normalize_cards(vec![card], &packs).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingPack { .. }));
    }

    #[test]
    fn test_normalize_cards_is_deterministic() {
        let packs = pack_map(&["core", "reprint"]);
        let build = || {
            let original = raw("01001", "core");
            let mut duplicate = raw("02001", "reprint");
            duplicate.duplicate_of = Some("01001".to_string());
            let other = raw("01050", "core");
            normalize_cards(vec![original, duplicate, other], &packs).unwrap()
        };

        let first = serde_json::to_string(&build().canonical_cards()).unwrap();
        let second = serde_json::to_string(&build().canonical_cards()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_cards_resolves_date_from_pack() {
        let mut packs = pack_map(&["core"]);
        packs.insert("late".to_string(), pack("late", "2022-03-04"));
        let card = raw("05001", "late");

        let index = normalize_cards(vec![card], &packs).unwrap();
        assert_eq!(
            index.resolve("05001").unwrap().date_available,
            chrono::NaiveDate::from_ymd_opt(2022, 3, 4).unwrap()
        );
    }

    fn hero_card(code: &str, name: &str, pack: &str, traits: &str) -> RawCard {
        RawCard {
            code: code.to_string(),
            name: name.to_string(),
            subname: String::new(),
            pack_code: pack.to_string(),
            type_code: "hero".to_string(),
            faction_code: "hero".to_string(),
            traits: traits.to_string(),
            duplicate_of: None,
            text: String::new(),
            card_set_name: name.to_string(),
            linked_card: None,
        }
    }

    #[test]
    fn test_build_heroes_merges_linked_card_traits() {
        let packs = pack_map(&["core"]);
        let mut hero = hero_card("01001a", "Spider-Man", "core", "Avenger.");
        hero.linked_card = Some(Box::new(RawLinkedCard {
            code: "01001b".to_string(),
        }));
        let mut alter_ego = hero_card("01001b", "Peter Parker", "core", "Genius.");
        alter_ego.type_code = "alter_ego".to_string();
        alter_ego.faction_code = "hero".to_string();

        let index = normalize_cards(vec![hero, alter_ego], &packs).unwrap();
        let heroes = build_heroes(&index).unwrap();

        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].code, "01001a");
        assert_eq!(heroes[0].traits, vec!["Avenger", "Genius"]);
    }

    #[test]
    fn test_build_heroes_merges_same_name_same_pack() {
        let packs = pack_map(&["ironheart"]);
        let first = hero_card("29001a", "Ironheart", "ironheart", "Genius.");
        let second = hero_card("29002a", "Ironheart", "ironheart", "Avenger.");

        let index = normalize_cards(vec![first, second], &packs).unwrap();
        let heroes = build_heroes(&index).unwrap();

        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].code, "29001a");
        assert!(heroes[0].has_trait("Genius"));
        assert!(heroes[0].has_trait("Avenger"));
    }

    #[test]
    fn test_build_heroes_applies_granted_traits() {
        let packs = pack_map(&["core"]);
        let hero = hero_card("01001a", "Spider-Man", "core", "");
        let mut kit_card = raw("01005", "core");
        kit_card.card_set_name = "Spider-Man".to_string();
        kit_card.text = "Your hero gains the [[Avenger]] trait.".to_string();

        let index = normalize_cards(vec![hero, kit_card], &packs).unwrap();
        let heroes = build_heroes(&index).unwrap();

        assert!(heroes[0].has_trait("Avenger"));
    }

    #[test]
    fn test_build_heroes_missing_linked_card_is_fatal() {
        let packs = pack_map(&["core"]);
        let mut hero = hero_card("01001a", "Spider-Man", "core", "");
        hero.linked_card = Some(Box::new(RawLinkedCard {
            code: "01001b".to_string(),
        }));

        let index = normalize_cards(vec![hero], &packs).unwrap();
        let err = build_heroes(&index).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingLinkedCard { .. }));
    }

    #[test]
    fn test_build_heroes_skips_non_hero_cards() {
        let packs = pack_map(&["core"]);
        let ally = raw("01052", "core");

        let index = normalize_cards(vec![ally], &packs).unwrap();
        assert!(build_heroes(&index).unwrap().is_empty());
    }
}
