use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::Pack;

/// `GET /packs`: all known packs, oldest first.
pub async fn list_packs(State(state): State<AppState>) -> Result<Json<Vec<Pack>>, ApiError> {
    let packs = state.valuator.get_packs().await?;
    Ok(Json(packs))
}
