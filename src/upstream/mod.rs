//! Upstream card-catalog client.
//!
//! Fetches packs, cards, and per-day decklists from the public catalog
//! API. All upstream specifics (endpoint paths, wire field names, the
//! transient-failure quirk of the by-date endpoint) are isolated in this
//! module behind the [`CatalogProvider`] trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{Decklist, Pack};

/// Errors from the upstream catalog.
///
/// `Transient` is a typed classification, not string matching: the
/// by-date decklist endpoint answers a server error for days with no
/// published decks, and the crawl recovers from exactly that kind.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transient upstream failure ({status}) fetching {endpoint}")]
    Transient { status: u16, endpoint: String },

    #[error("unexpected status {status} fetching {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl UpstreamError {
    /// Whether this failure may be treated as "no data" by callers that
    /// can tolerate it (the deck crawl).
    pub fn is_transient(&self) -> bool {
        matches!(self, UpstreamError::Transient { .. })
    }
}

/// A pack record as published by the catalog API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPack {
    pub code: String,
    pub name: String,
    pub id: i64,
    #[serde(default)]
    pub available: String,
}

impl From<RawPack> for Pack {
    fn from(raw: RawPack) -> Self {
        Pack {
            code: raw.code,
            name: raw.name,
            id: raw.id,
            available: raw.available,
        }
    }
}

/// A card record as published by the catalog API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCard {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub subname: String,
    pub pack_code: String,
    pub type_code: String,
    pub faction_code: String,
    #[serde(default)]
    pub traits: String,
    #[serde(default, rename = "duplicate_of_code")]
    pub duplicate_of: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub card_set_name: String,
    #[serde(default)]
    pub linked_card: Option<Box<RawLinkedCard>>,
}

/// The linked-card stub nested inside a [`RawCard`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawLinkedCard {
    pub code: String,
}

/// The upstream data source: packs, cards, and decklists by creation day.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn all_packs(&self) -> Result<Vec<RawPack>, UpstreamError>;

    async fn all_cards(&self) -> Result<Vec<RawCard>, UpstreamError>;

    /// All decklists published on the given day. May fail `Transient`
    /// when the day has no decks.
    async fn decklists_by_date(&self, date: NaiveDate) -> Result<Vec<Decklist>, UpstreamError>;
}

/// Configuration for the HTTP catalog client.
#[derive(Debug, Clone)]
pub struct CardDbConfig {
    /// API base, e.g. `https://carddb.example.com/api/public/`.
    pub base_url: Url,

    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Default for CardDbConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://marvelcdb.com/api/public/")
                .expect("default base url is valid"),
            timeout: Duration::from_secs(10),
            user_agent: concat!("card-valuator/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP implementation of [`CatalogProvider`].
pub struct CardDbClient {
    client: Client,
    config: CardDbConfig,
}

impl CardDbClient {
    pub fn new(config: CardDbConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, UpstreamError> {
        Self::new(CardDbConfig::default())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, UpstreamError> {
        let url = self.config.base_url.join(endpoint)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(UpstreamError::Transient {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogProvider for CardDbClient {
    async fn all_packs(&self) -> Result<Vec<RawPack>, UpstreamError> {
        self.get_json("packs").await
    }

    async fn all_cards(&self) -> Result<Vec<RawCard>, UpstreamError> {
        self.get_json("cards").await
    }

    async fn decklists_by_date(&self, date: NaiveDate) -> Result<Vec<Decklist>, UpstreamError> {
        let endpoint = format!("decklists/by_date/{}", date.format("%Y-%m-%d"));
        self.get_json(&endpoint).await
    }
}
