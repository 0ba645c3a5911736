//! REST API endpoints.
//!
//! Axum-based HTTP surface over the valuation service: pack listing and
//! personalized card/pack values. Query-string parsing for owned packs
//! and aspect weights lives here; the service receives them typed.

pub mod routes;
pub mod state;

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::ServiceError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/packs", get(routes::packs::list_packs))
        .route("/card_values", get(routes::card_values::value_cards))
        .route("/pack_values", get(routes::pack_values::value_packs))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a comma-separated list, dropping empty entries.
pub fn parse_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `aspect:weight` pairs, e.g. `aggression:1.5,justice:0.5`.
pub fn parse_weights(raw: Option<&str>) -> Result<HashMap<String, f64>, ApiError> {
    let mut weights = HashMap::new();
    for pair in parse_csv(raw) {
        let (aspect, weight) = pair.split_once(':').ok_or_else(|| {
            ApiError::BadRequest(format!("expected aspect:weight, got {:?}", pair))
        })?;
        let weight: f64 = weight.trim().parse().map_err(|_| {
            ApiError::BadRequest(format!("invalid weight for aspect {:?}", aspect))
        })?;
        weights.insert(aspect.trim().to_string(), weight);
    }
    Ok(weights)
}
