//! Service catalog rates and the pet foreign-key directory.
//!
//! Rate changes apply prospectively: bookings priced before the change
//! keep their stored totals.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use crate::domain::context::{Clock, RequestContext};
use crate::domain::errors::{BookingError, BookingResult, ValidationError};
use crate::domain::models::catalog::{Pet, Service};
use crate::domain::pricing::{ensure_within_limit, round_currency, MAX_CHARGE_AMOUNT};
use crate::storage::{CatalogRepository, DbConnection};
use shared::ServiceType;

pub const DEFAULT_BOARDING_RATE: Decimal = dec!(50.00);
pub const DEFAULT_DAYCARE_RATE: Decimal = dec!(40.00);

#[derive(Clone)]
pub struct CatalogService {
    catalog: CatalogRepository,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(db: DbConnection, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: CatalogRepository::new(db),
            clock,
        }
    }

    /// Give each service a starting rate unless it already has one
    pub async fn seed_default_rates(&self) -> BookingResult<()> {
        let now = self.clock.now();
        for (service_type, rate) in [
            (ServiceType::Boarding, DEFAULT_BOARDING_RATE),
            (ServiceType::Daycare, DEFAULT_DAYCARE_RATE),
        ] {
            if self.catalog.insert_rate_if_missing(service_type, rate, now).await? {
                info!(service = %service_type, %rate, "Seeded default rate");
            }
        }
        Ok(())
    }

    pub async fn list_services(&self) -> BookingResult<Vec<Service>> {
        Ok(self.catalog.list_services().await?)
    }

    pub async fn set_rate(
        &self,
        ctx: &RequestContext,
        service_type: ServiceType,
        rate: Decimal,
    ) -> BookingResult<Service> {
        ctx.require_staff("change service rates")?;
        if rate <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(rate).into());
        }
        let rate = round_currency(rate);
        ensure_within_limit(rate, MAX_CHARGE_AMOUNT)?;

        self.catalog
            .upsert_rate(service_type, rate, self.clock.now())
            .await?;
        info!(service = %service_type, %rate, actor_id = %ctx.actor_id, "Service rate changed");
        Ok(Service { service_type, rate })
    }

    /// Record a pet's owner so bookings can be checked against it.
    /// Clients may register their own pets; re-registering someone else's
    /// pet is refused.
    pub async fn register_pet(&self, ctx: &RequestContext, pet: Pet) -> BookingResult<Pet> {
        ctx.require_owner_or_staff(&pet.owner_id, "register a pet for another owner")?;
        if pet.id.trim().is_empty() || pet.owner_id.trim().is_empty() {
            return Err(
                ValidationError::Malformed("Pet id and owner id are required".to_string()).into(),
            );
        }

        if let Some(existing) = self.catalog.get_pet(&pet.id).await? {
            if existing.owner_id != pet.owner_id && !ctx.is_staff() {
                return Err(BookingError::PermissionDenied {
                    action: "re-register another owner's pet",
                });
            }
        }
        self.catalog.upsert_pet(&pet).await?;
        info!(pet_id = %pet.id, owner_id = %pet.owner_id, "Registered pet");
        Ok(pet)
    }
}
