//! # Card Valuator
//!
//! A valuation service for card-game collections: community decklist
//! usage is distilled into a value score for every card and every
//! purchasable pack, adjusted per caller for the packs they already own.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (packs, cards, heroes, decklists, values)
//! - **upstream**: Catalog provider client (packs, cards, decklists by day)
//! - **store**: Document-store seam and the in-memory implementation
//! - **sync**: Freshness gate, refresh pipeline, catalog normalizer
//! - **calculate**: Eligibility rules and the scoring formula
//! - **service**: The valuation service object wired into request handlers
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod service;
pub mod store;
pub mod sync;
pub mod upstream;

pub use models::*;
