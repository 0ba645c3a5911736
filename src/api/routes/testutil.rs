//! Shared fixtures for endpoint tests: a preloaded in-memory store
//! stamped fresh, so handlers serve without touching the upstream.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tower::util::ServiceExt;

use crate::api::state::AppState;
use crate::models::{Card, CardValue, Decklist, Hero, Pack, PackValue, SyncMeta};
use crate::service::Valuator;
use crate::store::{CatalogStore, MemoryStore};
use crate::sync::SyncConfig;
use crate::upstream::{CatalogProvider, RawCard, RawPack, UpstreamError};

struct UnreachableProvider;

#[async_trait]
impl CatalogProvider for UnreachableProvider {
    async fn all_packs(&self) -> Result<Vec<RawPack>, UpstreamError> {
        panic!("provider must not be called while data is fresh");
    }

    async fn all_cards(&self) -> Result<Vec<RawCard>, UpstreamError> {
        panic!("provider must not be called while data is fresh");
    }

    async fn decklists_by_date(&self, _date: NaiveDate) -> Result<Vec<Decklist>, UpstreamError> {
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

fn card(code: &str, aspect: &str, pack: &str) -> Card {
    Card {
        code: code.to_string(),
        name: code.to_string(),
        subname: String::new(),
        pack_codes: vec![pack.to_string()],
        type_code: "ally".to_string(),
        aspect: aspect.to_string(),
        traits: vec![],
        locking_traits: vec![],
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

/// App state over a store holding two packs, two valued cards, one hero.
pub(crate) async fn test_state() -> AppState {
    let store = Arc::new(MemoryStore::new());

    store
        .replace_packs(vec![pack("guards", "2020-08-13"), pack("core", "2019-10-18")])
        .await
        .unwrap();
    store
        .replace_cards(vec![
            card("01052", "aggression", "core"),
            card("02010", "justice", "guards"),
        ])
        .await
        .unwrap();
    store
        .replace_heroes(vec![Hero {
            code: "01001a".to_string(),
            pack_code: "core".to_string(),
            name: "Spider-Man".to_string(),
            traits: vec!["Avenger".to_string()],
        }])
        .await
        .unwrap();

    let core_value = base_value(card("01052", "aggression", "core"), 4, 2);
    let guards_value = base_value(card("02010", "justice", "guards"), 4, 1);
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

    AppState {
        valuator: Arc::new(Valuator::new(
            store,
            Arc::new(UnreachableProvider),
            SyncConfig::default(),
        )),
    }
}

pub(crate) async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
