//! # REST API for Availability
//!
//! Cheap, repeatable read of per-date occupancy for polling clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_availability))
}

#[derive(Deserialize, Debug)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /api/availability?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn list_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> impl IntoResponse {
    info!("GET /api/availability - query: {:?}", query);

    match state
        .booking_service
        .list_availability(query.from, query.to)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
