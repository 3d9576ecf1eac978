//! Domain models for the service catalog and the pet directory.
use rust_decimal::Decimal;
use shared::ServiceType;

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub service_type: ServiceType,
    /// Per night for boarding, per day for daycare
    pub rate: Decimal,
}

/// Foreign-key view of a pet; profiles live in the external directory
#[derive(Debug, Clone, PartialEq)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
}
