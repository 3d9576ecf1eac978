//! # REST API Interface Layer
//!
//! HTTP endpoints for the booking and settlement engine.
//!
//! - Every mutating endpoint requires the `x-actor-id` and `x-actor-role`
//!   headers set by the upstream auth layer (see [`context`]).
//! - Domain errors map to distinct statuses with a stable `code` in the
//!   JSON body (see [`error`]); "payment required" and "insufficient funds"
//!   surface as 402, never as a generic 400.
//! - Reads are cheap and side-effect free so clients can poll them.

pub mod availability_apis;
pub mod booking_apis;
pub mod catalog_apis;
pub mod context;
pub mod error;
pub mod mappers;
pub mod settlement_apis;
pub mod wallet_apis;

use axum::Router;

use crate::AppState;

/// All API routes, to be nested under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking_apis::router())
        .nest("/availability", availability_apis::router())
        .nest("/settlements", settlement_apis::router())
        .nest("/wallets", wallet_apis::router())
        .nest("/services", catalog_apis::services_router())
        .nest("/pets", catalog_apis::pets_router())
}
