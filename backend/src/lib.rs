//! # PetStay Backend
//!
//! Booking and settlement engine for a single pet boarding / daycare
//! facility, served over a small REST API.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST handlers, DTO mapping)
//!     ↓
//! Domain Layer (pricing, availability, booking state machine, settlement)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```
//!
//! [`initialize_backend`] wires the layers from a [`config::Config`];
//! [`create_router`] turns the resulting [`AppState`] into an axum router.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderName, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::domain::{
    BookingNotifier, BookingService, CatalogService, Clock, LoggingNotifier, Services,
    SettlementService, SystemClock, WalletService,
};
use crate::io::rest::context::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::storage::DbConnection;

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub booking_service: BookingService,
    pub settlement_service: SettlementService,
    pub wallet_service: WalletService,
    pub catalog_service: CatalogService,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            booking_service: services.bookings,
            settlement_service: services.settlement,
            wallet_service: services.wallets,
            catalog_service: services.catalog,
        }
    }

    /// Wire all services over an already-initialized database
    pub async fn build(
        db: DbConnection,
        config: &Config,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Result<Self> {
        config.policy.validate()?;
        let services = Services::new(db, Arc::new(config.policy.clone()), clock, notifier);
        services.catalog.seed_default_rates().await?;
        Ok(Self::new(services))
    }
}

/// Open the configured database and build the application state
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url).await?;

    info!("Setting up domain services");
    let state = AppState::build(
        db,
        config,
        Arc::new(SystemClock),
        Arc::new(LoggingNotifier),
    )
    .await?;

    info!(
        capacity = config.policy.daily_capacity,
        cutoff_hours = config.policy.cancellation_cutoff_hours,
        "Backend ready"
    );
    Ok(state)
}

/// Create the axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(ACTOR_ID_HEADER),
            HeaderName::from_static(ACTOR_ROLE_HEADER),
        ]);

    Router::new()
        .nest("/api", io::rest::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
