use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{parse_csv, parse_weights, ApiError};
use crate::models::PackValue;

#[derive(Debug, Deserialize)]
pub struct PackValuesParams {
    /// Comma-separated owned pack codes.
    pub owned: Option<String>,

    /// Comma-separated `aspect:weight` pairs.
    pub weights: Option<String>,
}

/// `GET /pack_values?owned=core&weights=aggression:1.5`: every pack's
/// value adjusted for the caller's collection, best first.
pub async fn value_packs(
    State(state): State<AppState>,
    Query(params): Query<PackValuesParams>,
) -> Result<Json<Vec<PackValue>>, ApiError> {
    let owned = parse_csv(params.owned.as_deref());
    let weights = parse_weights(params.weights.as_deref())?;
    let values = state.valuator.value_all_packs(&owned, &weights).await?;
    Ok(Json(values))
}
