//! # REST API for Settlement
//!
//! Quotes, single-group and "pay all" settlement against the owner's wallet.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::context::RequestContext;
use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::settlement_mapper::SettlementMapper;
use crate::AppState;
use shared::{SettleAllRequest, SettleRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(settle))
        .route("/all", post(settle_all))
        .route("/quote", post(quote))
        .route("/outstanding", get(outstanding_groups))
}

#[derive(Deserialize, Debug)]
pub struct OutstandingQuery {
    pub owner_id: String,
}

/// POST /api/settlements
pub async fn settle(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<SettleRequest>,
) -> impl IntoResponse {
    info!("POST /api/settlements - actor: {}, request: {:?}", ctx.actor_id, request);

    let command = SettlementMapper::to_command(request);
    match state.settlement_service.settle(&ctx, command).await {
        Ok(receipt) => (StatusCode::OK, Json(SettlementMapper::to_receipt_dto(receipt))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /api/settlements/all
pub async fn settle_all(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<SettleAllRequest>,
) -> impl IntoResponse {
    info!("POST /api/settlements/all - actor: {}, owner: {}", ctx.actor_id, request.owner_id);

    match state.settlement_service.settle_all(&ctx, &request.owner_id).await {
        Ok(receipt) => (StatusCode::OK, Json(SettlementMapper::to_receipt_dto(receipt))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /api/settlements/quote - read-only
pub async fn quote(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<SettleRequest>,
) -> impl IntoResponse {
    info!("POST /api/settlements/quote - actor: {}, request: {:?}", ctx.actor_id, request);

    let command = SettlementMapper::to_command(request);
    match state.settlement_service.quote(&ctx, command).await {
        Ok(quote) => (StatusCode::OK, Json(SettlementMapper::to_quote_dto(quote))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn outstanding_groups(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<OutstandingQuery>,
) -> impl IntoResponse {
    info!("GET /api/settlements/outstanding - actor: {}, owner: {}", ctx.actor_id, query.owner_id);

    match state
        .settlement_service
        .outstanding_groups(&ctx, &query.owner_id)
        .await
    {
        Ok(groups) => (StatusCode::OK, Json(SettlementMapper::to_outstanding_dto(groups))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
