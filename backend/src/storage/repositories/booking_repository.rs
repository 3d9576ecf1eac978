use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::domain::models::booking::Booking;
use crate::storage::{
    format_date, from_cents, parse_date, parse_enum, parse_timestamp, to_cents, DbConnection,
};

const BOOKING_COLUMNS: &str = "id, owner_id, pet_id, service_type, start_date, end_date, status, \
     total_cents, charge_kind, is_paid, notes, processed_by, status_note, created_at, updated_at";

/// Repository for booking rows
#[derive(Clone)]
pub struct BookingRepository {
    db: DbConnection,
}

impl BookingRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<Booking, sqlx::Error> {
        Ok(Booking {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            pet_id: row.try_get("pet_id")?,
            service_type: parse_enum(row.try_get::<&str, _>("service_type")?)?,
            start_date: parse_date(row.try_get::<&str, _>("start_date")?)?,
            end_date: parse_date(row.try_get::<&str, _>("end_date")?)?,
            status: parse_enum(row.try_get::<&str, _>("status")?)?,
            total_price: from_cents(row.try_get("total_cents")?),
            charge_kind: parse_enum(row.try_get::<&str, _>("charge_kind")?)?,
            is_paid: row.try_get("is_paid")?,
            notes: row.try_get("notes")?,
            processed_by: row.try_get("processed_by")?,
            status_note: row.try_get("status_note")?,
            created_at: parse_timestamp(row.try_get::<&str, _>("created_at")?)?,
            updated_at: parse_timestamp(row.try_get::<&str, _>("updated_at")?)?,
        })
    }

    pub async fn get(&self, booking_id: &str) -> Result<Option<Booking>, sqlx::Error> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(booking_id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(Self::map_row).transpose()
    }

    pub async fn get_in(
        conn: &mut SqliteConnection,
        booking_id: &str,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(booking_id)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(Self::map_row).transpose()
    }

    /// Fetch the given ids in creation order; unknown ids are simply absent
    pub async fn get_many(&self, booking_ids: &[String]) -> Result<Vec<Booking>, sqlx::Error> {
        if booking_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; booking_ids.len()].join(", ");
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id IN ({placeholders}) ORDER BY ROWID ASC"
        );
        let mut query = sqlx::query(&sql);
        for id in booking_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::map_row).collect()
    }

    /// All bookings (optionally for one owner) in creation order
    pub async fn list(&self, owner_id: Option<&str>) -> Result<Vec<Booking>, sqlx::Error> {
        let rows = match owner_id {
            Some(owner_id) => {
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE owner_id = ? ORDER BY ROWID ASC"
                );
                sqlx::query(&sql)
                    .bind(owner_id)
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY ROWID ASC");
                sqlx::query(&sql).fetch_all(self.db.pool()).await?
            }
        };
        rows.iter().map(Self::map_row).collect()
    }

    /// Bookings holding capacity on any date of `[start, end]`
    pub async fn list_holding_capacity(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE start_date <= ? AND end_date >= ? \
             AND status IN ('Pending', 'Confirmed', 'CheckedIn') \
             ORDER BY ROWID ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(format_date(end))
            .bind(format_date(start))
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Self::map_row).collect()
    }

    pub async fn insert_in(conn: &mut SqliteConnection, booking: &Booking) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, owner_id, pet_id, service_type, start_date, end_date, status,
                                  total_cents, charge_kind, is_paid, notes, processed_by, status_note,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.owner_id)
        .bind(&booking.pet_id)
        .bind(booking.service_type.as_str())
        .bind(format_date(booking.start_date))
        .bind(format_date(booking.end_date))
        .bind(booking.status.as_str())
        .bind(to_cents(booking.total_price)?)
        .bind(booking.charge_kind.as_str())
        .bind(booking.is_paid)
        .bind(&booking.notes)
        .bind(&booking.processed_by)
        .bind(&booking.status_note)
        .bind(booking.created_at.to_rfc3339())
        .bind(booking.updated_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Write the mutable fields of `after` only if the stored row still
    /// matches `before` in status, payment and charge. Returns false when
    /// the row moved underneath us (another transition or a settlement).
    pub async fn update_if_unchanged_in(
        conn: &mut SqliteConnection,
        after: &Booking,
        before: &Booking,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, total_cents = ?, charge_kind = ?, is_paid = ?,
                processed_by = ?, status_note = ?, updated_at = ?
            WHERE id = ? AND status = ? AND is_paid = ?
              AND total_cents = ? AND charge_kind = ?
            "#,
        )
        .bind(after.status.as_str())
        .bind(to_cents(after.total_price)?)
        .bind(after.charge_kind.as_str())
        .bind(after.is_paid)
        .bind(&after.processed_by)
        .bind(&after.status_note)
        .bind(after.updated_at.to_rfc3339())
        .bind(&before.id)
        .bind(before.status.as_str())
        .bind(before.is_paid)
        .bind(to_cents(before.total_price)?)
        .bind(before.charge_kind.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark one booking paid, guarded on the exact charge the caller priced.
    /// Returns false if the row is already paid or its charge has changed.
    pub async fn mark_paid_in(
        conn: &mut SqliteConnection,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET is_paid = TRUE, updated_at = ?
            WHERE id = ? AND owner_id = ? AND is_paid = FALSE
              AND status = ? AND total_cents = ? AND charge_kind = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(&booking.id)
        .bind(&booking.owner_id)
        .bind(booking.status.as_str())
        .bind(to_cents(booking.total_price)?)
        .bind(booking.charge_kind.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
