use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use pitchside_core::repository::ReservationStore;
use pitchside_core::reservation::{
    BookedSlot, Holder, PaymentRecord, Reservation, ReservationStatus, Slot, SlotConflict,
};
use pitchside_core::{BookingError, BookingResult};

use crate::store_err;

/// Postgres-backed reservation store. Slot conflicts are settled inside a
/// transaction that holds an advisory lock on the turf and day, so two
/// racing bookings for the same slot serialize and exactly one wins.
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A conditional transition matched no row. Work out whether the
    /// reservation is in the wrong state or simply gone.
    async fn transition_failure(&self, id: Uuid, requested: ReservationStatus) -> BookingError {
        match self.load_status(id).await {
            Ok(Some(current)) => BookingError::InvalidState {
                current,
                requested: requested.to_string(),
            },
            Ok(None) => BookingError::NotFound(id.to_string()),
            Err(err) => err,
        }
    }

    async fn load_status(&self, id: Uuid) -> BookingResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.map(|(status,)| status))
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    holder_id: String,
    holder_name: String,
    holder_email: String,
    turf_id: Uuid,
    date: String,
    slots: Value,
    price: i64,
    status: String,
    payment: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> BookingResult<Reservation> {
        let status: ReservationStatus = self.status.parse().map_err(BookingError::Store)?;
        let slots: Vec<Slot> = serde_json::from_value(self.slots).map_err(store_err)?;
        let payment: Option<PaymentRecord> = match self.payment {
            Some(value) => Some(serde_json::from_value(value).map_err(store_err)?),
            None => None,
        };
        Ok(Reservation {
            id: self.id,
            holder: Holder {
                id: self.holder_id,
                name: self.holder_name,
                email: self.holder_email,
            },
            turf_id: self.turf_id,
            date: self.date,
            slots,
            price: self.price,
            status,
            payment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ConflictRow {
    id: Uuid,
    holder_id: String,
    holder_name: String,
    holder_email: String,
}

impl ConflictRow {
    fn into_conflict(self, turf_id: Uuid, date: &str, slot: &Slot) -> SlotConflict {
        SlotConflict {
            reservation_id: self.id,
            turf_id,
            date: date.to_string(),
            slot: slot.clone(),
            holder: Some(Holder {
                id: self.holder_id,
                name: self.holder_name,
                email: self.holder_email,
            }),
        }
    }
}

/// Containment query against the JSONB slot array. Slot objects carry
/// exactly two keys, so `@>` on a one-element array is an exact match.
const CONFLICT_SQL: &str = "SELECT id, holder_id, holder_name, holder_email FROM reservations \
     WHERE turf_id = $1 AND date = $2 AND status IN ('pending', 'confirmed', 'paid') AND slots @> $3 \
     LIMIT 1";

fn slot_probe(slot: &Slot) -> BookingResult<Value> {
    Ok(Value::Array(vec![serde_json::to_value(slot).map_err(store_err)?]))
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn create(&self, reservation: &Reservation) -> BookingResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // Serialize writers for this turf and day; the conflict checks and
        // the insert below happen as one unit under the lock.
        let lock_key = format!("{}:{}", reservation.turf_id, reservation.date);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&lock_key)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        for slot in &reservation.slots {
            let rival: Option<ConflictRow> = sqlx::query_as(CONFLICT_SQL)
                .bind(reservation.turf_id)
                .bind(&reservation.date)
                .bind(slot_probe(slot)?)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;

            if let Some(row) = rival {
                // Dropping the transaction rolls it back.
                return Err(BookingError::SlotConflict {
                    conflict: row.into_conflict(reservation.turf_id, &reservation.date, slot),
                });
            }
        }

        let slots = serde_json::to_value(&reservation.slots).map_err(store_err)?;
        let row: ReservationRow = sqlx::query_as(
            "INSERT INTO reservations \
                 (id, holder_id, holder_name, holder_email, turf_id, date, slots, price, status, payment, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, $10, $11) \
             RETURNING id, holder_id, holder_name, holder_email, turf_id, date, slots, price, status, payment, created_at, updated_at",
        )
        .bind(reservation.id)
        .bind(&reservation.holder.id)
        .bind(&reservation.holder.name)
        .bind(&reservation.holder.email)
        .bind(reservation.turf_id)
        .bind(&reservation.date)
        .bind(&slots)
        .bind(reservation.price)
        .bind(reservation.status.to_string())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        row.into_reservation()
    }

    async fn get(&self, id: Uuid) -> BookingResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            "SELECT id, holder_id, holder_name, holder_email, turf_id, date, slots, price, status, payment, created_at, updated_at \
             FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        match row {
            Some(row) => Ok(Some(row.into_reservation()?)),
            None => Ok(None),
        }
    }

    async fn find_conflict(&self, turf_id: Uuid, date: &str, slot: &Slot) -> BookingResult<Option<SlotConflict>> {
        let rival: Option<ConflictRow> = sqlx::query_as(CONFLICT_SQL)
            .bind(turf_id)
            .bind(date)
            .bind(slot_probe(slot)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(rival.map(|row| row.into_conflict(turf_id, date, slot)))
    }

    async fn booked_slots(&self, turf_id: Uuid, date: &str) -> BookingResult<Vec<BookedSlot>> {
        let rows: Vec<(Value, String)> = sqlx::query_as(
            "SELECT slots, status FROM reservations \
             WHERE turf_id = $1 AND date = $2 AND status IN ('pending', 'confirmed', 'paid')",
        )
        .bind(turf_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut booked = Vec::new();
        for (slots, status) in rows {
            let status: ReservationStatus = status.parse().map_err(BookingError::Store)?;
            let slots: Vec<Slot> = serde_json::from_value(slots).map_err(store_err)?;
            booked.extend(slots.into_iter().map(|slot| BookedSlot { slot, status }));
        }
        booked.sort_by(|a, b| a.slot.start_time.cmp(&b.slot.start_time));
        Ok(booked)
    }

    async fn mark_paid(&self, id: Uuid, payment: PaymentRecord) -> BookingResult<Reservation> {
        let payment = serde_json::to_value(&payment).map_err(store_err)?;
        let row: Option<ReservationRow> = sqlx::query_as(
            "UPDATE reservations SET status = 'paid', payment = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING id, holder_id, holder_name, holder_email, turf_id, date, slots, price, status, payment, created_at, updated_at",
        )
        .bind(id)
        .bind(&payment)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        match row {
            Some(row) => row.into_reservation(),
            None => Err(self.transition_failure(id, ReservationStatus::Paid).await),
        }
    }

    async fn mark_cancelled(&self, id: Uuid) -> BookingResult<Reservation> {
        let row: Option<ReservationRow> = sqlx::query_as(
            "UPDATE reservations SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING id, holder_id, holder_name, holder_email, turf_id, date, slots, price, status, payment, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        match row {
            Some(row) => row.into_reservation(),
            None => Err(self.transition_failure(id, ReservationStatus::Cancelled).await),
        }
    }

    async fn delete_expired_pending(&self, cutoff: DateTime<Utc>) -> BookingResult<Vec<Reservation>> {
        // The status predicate sits inside the delete itself, so a row
        // paid after the sweep selected it is left alone.
        let rows: Vec<ReservationRow> = sqlx::query_as(
            "DELETE FROM reservations WHERE status = 'pending' AND created_at < $1 \
             RETURNING id, holder_id, holder_name, holder_email, turf_id, date, slots, price, status, payment, created_at, updated_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }
}
