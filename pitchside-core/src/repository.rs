use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reservation::{BookedSlot, PaymentRecord, Reservation, Slot, SlotConflict};
use crate::BookingResult;

/// Persistence seam for reservations. Implementations own the atomicity
/// guarantees; callers never take locks of their own.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Check every requested slot and insert in one atomic step. The
    /// first writer wins; the loser gets the conflict, holder included.
    async fn create(&self, reservation: &Reservation) -> BookingResult<Reservation>;

    async fn get(&self, id: Uuid) -> BookingResult<Option<Reservation>>;

    /// Whoever currently occupies the exact slot on that turf and day,
    /// if anyone.
    async fn find_conflict(&self, turf_id: Uuid, date: &str, slot: &Slot) -> BookingResult<Option<SlotConflict>>;

    /// Occupied slots for a turf and day, without holder identity.
    async fn booked_slots(&self, turf_id: Uuid, date: &str) -> BookingResult<Vec<BookedSlot>>;

    /// Conditional `pending` to `paid` transition, attaching the payment
    /// record in the same step. Any other current status is an
    /// `InvalidState` error; missing rows are `NotFound`.
    async fn mark_paid(&self, id: Uuid, payment: PaymentRecord) -> BookingResult<Reservation>;

    /// Conditional transition to `cancelled` from a non-terminal status.
    async fn mark_cancelled(&self, id: Uuid) -> BookingResult<Reservation>;

    /// Remove pending reservations created before the cutoff, re-checking
    /// the status inside the delete itself. Returns the removed records.
    async fn delete_expired_pending(&self, cutoff: DateTime<Utc>) -> BookingResult<Vec<Reservation>>;
}

/// Turf catalog entry as far as booking cares: a price and an approval
/// gate. The catalog itself is owned elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turf {
    pub id: Uuid,
    pub name: String,
    pub price_per_hour: i64,
    pub is_approved: bool,
}

#[async_trait]
pub trait TurfCatalog: Send + Sync {
    async fn get_turf(&self, turf_id: Uuid) -> BookingResult<Option<Turf>>;
}
