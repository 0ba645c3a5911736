use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{parse_csv, ApiError};
use crate::models::CardValue;

#[derive(Debug, Deserialize)]
pub struct CardValuesParams {
    /// Comma-separated owned pack codes.
    pub owned: Option<String>,
}

/// `GET /card_values?owned=core,guards`: every card's value adjusted for
/// the caller's collection, best first.
pub async fn value_cards(
    State(state): State<AppState>,
    Query(params): Query<CardValuesParams>,
) -> Result<Json<Vec<CardValue>>, ApiError> {
    let owned = parse_csv(params.owned.as_deref());
    let values = state.valuator.value_all_cards(&owned).await?;
    Ok(Json(values))
}
