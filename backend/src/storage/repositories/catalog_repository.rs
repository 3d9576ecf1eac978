use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use crate::domain::models::catalog::{Pet, Service};
use crate::storage::{from_cents, parse_enum, to_cents, DbConnection};
use shared::ServiceType;

/// Repository for service rates and the pet foreign-key directory
#[derive(Clone)]
pub struct CatalogRepository {
    db: DbConnection,
}

impl CatalogRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn get_service(&self, service_type: ServiceType) -> Result<Option<Service>, sqlx::Error> {
        let row = sqlx::query("SELECT service_type, rate_cents FROM services WHERE service_type = ?")
            .bind(service_type.as_str())
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(Service {
                service_type: parse_enum(r.try_get::<&str, _>("service_type")?)?,
                rate: from_cents(r.try_get("rate_cents")?),
            })),
            None => Ok(None),
        }
    }

    pub async fn list_services(&self) -> Result<Vec<Service>, sqlx::Error> {
        let rows = sqlx::query("SELECT service_type, rate_cents FROM services ORDER BY service_type")
            .fetch_all(self.db.pool())
            .await?;

        rows.iter()
            .map(|r| -> Result<Service, sqlx::Error> {
                Ok(Service {
                    service_type: parse_enum(r.try_get::<&str, _>("service_type")?)?,
                    rate: from_cents(r.try_get("rate_cents")?),
                })
            })
            .collect()
    }

    pub async fn upsert_rate(
        &self,
        service_type: ServiceType,
        rate: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO services (service_type, rate_cents, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(service_type) DO UPDATE SET
                rate_cents = excluded.rate_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(service_type.as_str())
        .bind(to_cents(rate)?)
        .bind(now.to_rfc3339())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Insert a rate only if the service has none yet
    pub async fn insert_rate_if_missing(
        &self,
        service_type: ServiceType,
        rate: Decimal,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO services (service_type, rate_cents, updated_at) VALUES (?, ?, ?)",
        )
        .bind(service_type.as_str())
        .bind(to_cents(rate)?)
        .bind(now.to_rfc3339())
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn upsert_pet(&self, pet: &Pet) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO pets (id, owner_id, name) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, name = excluded.name
            "#,
        )
        .bind(&pet.id)
        .bind(&pet.owner_id)
        .bind(&pet.name)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_pet(&self, pet_id: &str) -> Result<Option<Pet>, sqlx::Error> {
        let row = sqlx::query("SELECT id, owner_id, name FROM pets WHERE id = ?")
            .bind(pet_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(Pet {
                id: r.try_get("id")?,
                owner_id: r.try_get("owner_id")?,
                name: r.try_get("name")?,
            })),
            None => Ok(None),
        }
    }
}
