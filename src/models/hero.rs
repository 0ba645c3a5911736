//! Hero model with multi-printing merge rules.

use serde::{Deserialize, Serialize};

/// A playable hero, assembled from one or more hero card printings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    /// Canonical hero card code, unique key.
    pub code: String,

    /// Pack the hero ships in.
    pub pack_code: String,

    /// Hero name.
    pub name: String,

    /// Union of traits across printings and linked alter-ego cards,
    /// sanitized via [`Hero::sanitize_traits`].
    pub traits: Vec<String>,
}

impl Hero {
    /// Merge another printing of the same hero into this one.
    ///
    /// Traits are unioned. The surviving code is the one whose numeric
    /// prefix (trailing letter stripped) is smaller; ties keep the
    /// lexicographically smaller code. The prefix scheme follows the
    /// upstream coding convention and is load-bearing for deterministic
    /// deduplication, so it is preserved rather than generalized.
    pub fn merge(&mut self, other: &Hero) {
        let keep_other = match (code_prefix(&self.code), code_prefix(&other.code)) {
            (Some(a), Some(b)) if a != b => b < a,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            _ => other.code < self.code,
        };
        if keep_other {
            self.code = other.code.clone();
        }
        self.traits.extend(other.traits.iter().cloned());
    }

    /// Trim whitespace, strip trailing periods, drop empties, and remove
    /// case-insensitive duplicates (first casing wins).
    pub fn sanitize_traits(&mut self) {
        let mut seen: Vec<String> = Vec::new();
        let mut cleaned: Vec<String> = Vec::new();
        for raw in &self.traits {
            let trimmed = raw.trim().trim_end_matches('.').trim().to_string();
            if trimmed.is_empty() {
                continue;
            }
            let folded = trimmed.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            cleaned.push(trimmed);
        }
        self.traits = cleaned;
    }

    /// Case-insensitive trait membership test.
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Numeric prefix of a hero card code: one trailing ASCII letter stripped,
/// remaining digits parsed. `None` for codes outside the scheme.
pub fn code_prefix(code: &str) -> Option<u64> {
    let trimmed = code
        .strip_suffix(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(code);
    trimmed.parse().ok()
}

/// Lookup key used to match deck hero codes against stored heroes: the
/// code with one trailing letter stripped. Hero cards and their alternate
/// faces share this prefix.
pub fn hero_key(code: &str) -> &str {
    code.strip_suffix(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(code)
}
