//! # REST API for Wallets

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::context::RequestContext;
use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::wallet_mapper::WalletMapper;
use crate::AppState;
use shared::{TopUpRequest, WalletTransactionListResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:owner_id", get(get_wallet).post(open_wallet))
        .route("/:owner_id/top-up", post(top_up))
        .route("/:owner_id/transactions", get(list_transactions))
}

#[derive(Deserialize, Debug)]
pub struct TransactionListQuery {
    pub limit: Option<u32>,
}

pub async fn open_wallet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(owner_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/wallets/{} - actor: {}", owner_id, ctx.actor_id);

    match state.wallet_service.open_wallet(&ctx, &owner_id).await {
        Ok(wallet) => (StatusCode::CREATED, Json(WalletMapper::to_wallet_dto(wallet))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn get_wallet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(owner_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/wallets/{} - actor: {}", owner_id, ctx.actor_id);

    match state.wallet_service.get_wallet(&ctx, &owner_id).await {
        Ok(wallet) => (StatusCode::OK, Json(WalletMapper::to_wallet_dto(wallet))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn top_up(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(owner_id): Path<String>,
    Json(request): Json<TopUpRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallets/{}/top-up - actor: {}, request: {:?}", owner_id, ctx.actor_id, request);

    match state
        .wallet_service
        .top_up(&ctx, &owner_id, request.amount, request.description)
        .await
    {
        Ok(entry) => (StatusCode::CREATED, Json(WalletMapper::to_transaction_dto(entry))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn list_transactions(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(owner_id): Path<String>,
    Query(query): Query<TransactionListQuery>,
) -> impl IntoResponse {
    info!("GET /api/wallets/{}/transactions - actor: {}, query: {:?}", owner_id, ctx.actor_id, query);

    match state
        .wallet_service
        .list_transactions(&ctx, &owner_id, query.limit)
        .await
    {
        Ok(entries) => {
            let response = WalletTransactionListResponse {
                transactions: WalletMapper::to_transaction_dto_list(entries),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
