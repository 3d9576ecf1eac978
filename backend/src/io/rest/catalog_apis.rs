//! # REST API for the Service Catalog and Pet Directory

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use shared::{RegisterPetRequest, ServiceType, UpdateRateRequest};
use tracing::info;

use crate::domain::context::RequestContext;
use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::wallet_mapper::WalletMapper;
use crate::AppState;

pub fn services_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services))
        .route("/:service_type/rate", put(set_rate))
}

pub fn pets_router() -> Router<AppState> {
    Router::new().route("/", post(register_pet))
}

pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/services");

    match state.catalog_service.list_services().await {
        Ok(services) => {
            let response: Vec<_> = services.into_iter().map(WalletMapper::to_service_dto).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// PUT /api/services/:service_type/rate - staff only, applies to future pricing
pub async fn set_rate(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(service_type): Path<String>,
    Json(request): Json<UpdateRateRequest>,
) -> impl IntoResponse {
    info!("PUT /api/services/{}/rate - actor: {}, request: {:?}", service_type, ctx.actor_id, request);

    let service_type = match service_type.parse::<ServiceType>() {
        Ok(service_type) => service_type,
        Err(e) => return ApiError::bad_request(e).into_response(),
    };
    match state
        .catalog_service
        .set_rate(&ctx, service_type, request.rate)
        .await
    {
        Ok(service) => (StatusCode::OK, Json(WalletMapper::to_service_dto(service))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn register_pet(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<RegisterPetRequest>,
) -> impl IntoResponse {
    info!("POST /api/pets - actor: {}, request: {:?}", ctx.actor_id, request);

    let pet = WalletMapper::to_domain_pet(request);
    match state.catalog_service.register_pet(&ctx, pet).await {
        Ok(pet) => (StatusCode::CREATED, Json(WalletMapper::to_pet_dto(pet))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
