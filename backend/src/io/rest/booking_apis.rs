//! # REST API for Bookings
//!
//! Creation, reads, grouping and every lifecycle transition of a booking.

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
use crate::io::rest::mappers::booking_mapper::BookingMapper;
use crate::AppState;
use shared::{
    BookingActionRequest, BookingListResponse, CancelBookingRequest, CreateBookingRequest,
    CreateBookingResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/groups", get(group_bookings))
        .route("/:booking_id", get(get_booking))
        .route("/:booking_id/accept", post(accept_booking))
        .route("/:booking_id/decline", post(decline_booking))
        .route("/:booking_id/check-in", post(check_in))
        .route("/:booking_id/check-out", post(check_out))
        .route("/:booking_id/cancel", post(cancel_booking))
        .route("/:booking_id/no-show", post(mark_no_show))
}

#[derive(Deserialize, Debug)]
pub struct OwnerQuery {
    pub owner_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Order,
    Billing,
}

#[derive(Deserialize, Debug)]
pub struct GroupQuery {
    #[serde(default)]
    pub by: GroupBy,
    pub owner_id: Option<String>,
}

/// POST /api/bookings - one booking row per selected pet
pub async fn create_booking(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<CreateBookingRequest>,
) -> impl IntoResponse {
    info!("POST /api/bookings - actor: {}, request: {:?}", ctx.actor_id, request);

    let command = BookingMapper::to_create_command(request);
    match state.booking_service.create_booking(&ctx, command).await {
        Ok(bookings) => {
            let response = CreateBookingResponse {
                bookings: BookingMapper::to_dto_list(bookings),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn list_bookings(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<OwnerQuery>,
) -> impl IntoResponse {
    info!("GET /api/bookings - actor: {}, query: {:?}", ctx.actor_id, query);

    match state
        .booking_service
        .list_bookings(&ctx, query.owner_id.as_deref())
        .await
    {
        Ok(bookings) => {
            let response = BookingListResponse {
                bookings: BookingMapper::to_dto_list(bookings),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET /api/bookings/groups?by=order|billing
pub async fn group_bookings(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<GroupQuery>,
) -> impl IntoResponse {
    info!("GET /api/bookings/groups - actor: {}, query: {:?}", ctx.actor_id, query);

    let owner_id = query.owner_id.as_deref();
    match query.by {
        GroupBy::Order => match state.booking_service.order_groups(&ctx, owner_id).await {
            Ok(groups) => {
                let response: Vec<_> = groups.into_iter().map(BookingMapper::to_order_group).collect();
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => ApiError::from(e).into_response(),
        },
        GroupBy::Billing => match state.booking_service.billing_groups(&ctx, owner_id).await {
            Ok(groups) => {
                let response: Vec<_> = groups.into_iter().map(BookingMapper::to_billing_group).collect();
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => ApiError::from(e).into_response(),
        },
    }
}

pub async fn get_booking(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/bookings/{} - actor: {}", booking_id, ctx.actor_id);

    match state.booking_service.get_booking(&ctx, &booking_id).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn accept_booking(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
    request: Option<Json<BookingActionRequest>>,
) -> impl IntoResponse {
    info!("POST /api/bookings/{}/accept - actor: {}", booking_id, ctx.actor_id);

    let command = BookingMapper::to_action_command(booking_id, request.map(|Json(r)| r));
    match state.booking_service.accept_booking(&ctx, command).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn decline_booking(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
    request: Option<Json<BookingActionRequest>>,
) -> impl IntoResponse {
    info!("POST /api/bookings/{}/decline - actor: {}", booking_id, ctx.actor_id);

    let command = BookingMapper::to_action_command(booking_id, request.map(|Json(r)| r));
    match state.booking_service.decline_booking(&ctx, command).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /api/bookings/:id/check-in - 402 while the stay is unpaid
pub async fn check_in(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
    request: Option<Json<BookingActionRequest>>,
) -> impl IntoResponse {
    info!("POST /api/bookings/{}/check-in - actor: {}", booking_id, ctx.actor_id);

    let command = BookingMapper::to_action_command(booking_id, request.map(|Json(r)| r));
    match state.booking_service.check_in(&ctx, command).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn check_out(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
    request: Option<Json<BookingActionRequest>>,
) -> impl IntoResponse {
    info!("POST /api/bookings/{}/check-out - actor: {}", booking_id, ctx.actor_id);

    let command = BookingMapper::to_action_command(booking_id, request.map(|Json(r)| r));
    match state.booking_service.check_out(&ctx, command).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
    request: Option<Json<CancelBookingRequest>>,
) -> impl IntoResponse {
    info!("POST /api/bookings/{}/cancel - actor: {}", booking_id, ctx.actor_id);

    let command = BookingMapper::to_cancel_command(booking_id, request.map(|Json(r)| r));
    match state.booking_service.cancel_booking(&ctx, command).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn mark_no_show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(booking_id): Path<String>,
    request: Option<Json<BookingActionRequest>>,
) -> impl IntoResponse {
    info!("POST /api/bookings/{}/no-show - actor: {}", booking_id, ctx.actor_id);

    let command = BookingMapper::to_action_command(booking_id, request.map(|Json(r)| r));
    match state.booking_service.mark_no_show(&ctx, command).await {
        Ok(booking) => (StatusCode::OK, Json(BookingMapper::to_dto(booking))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
