use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pitchside_core::events::{BookingEvent, EventBus};
use pitchside_core::identity::{permits, Actor, Operation};
use pitchside_core::repository::{ReservationStore, TurfCatalog};
use pitchside_core::reservation::{is_calendar_day, BookedSlot, Holder, Reservation, Slot, SlotConflict};
use pitchside_core::rules::BookingRules;
use pitchside_core::{BookingError, BookingResult};

/// Booking request as it arrives at the engine. The holder is the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservation {
    pub turf_id: Uuid,
    pub date: String,
    pub slots: Vec<Slot>,
}

/// A freshly created reservation plus its computed expiry deadline.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedReservation {
    pub reservation: Reservation,
    pub expires_at: DateTime<Utc>,
}

/// Creates and reads reservations. Conflict information that leaves this
/// manager is already privacy-filtered for the calling actor.
pub struct ReservationManager {
    store: Arc<dyn ReservationStore>,
    catalog: Arc<dyn TurfCatalog>,
    events: EventBus,
    rules: BookingRules,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn ReservationStore>, catalog: Arc<dyn TurfCatalog>, events: EventBus, rules: BookingRules) -> Self {
        Self {
            store,
            catalog,
            events,
            rules,
        }
    }

    /// Create a pending reservation for the actor. All requested slots
    /// must be free; a single collision rejects the whole request.
    pub async fn create(&self, actor: &Actor, request: CreateReservation) -> BookingResult<CreatedReservation> {
        validate_request(&request)?;

        let turf = self
            .catalog
            .get_turf(request.turf_id)
            .await?
            .filter(|turf| turf.is_approved)
            .ok_or_else(|| BookingError::TurfUnavailable(request.turf_id.to_string()))?;

        let price = turf.price_per_hour * request.slots.len() as i64;
        let holder = Holder {
            id: actor.id.clone(),
            name: actor.name.clone(),
            email: actor.email.clone(),
        };
        let reservation = Reservation::new(holder, request.turf_id, request.date, request.slots, price);

        let stored = match self.store.create(&reservation).await {
            Ok(stored) => stored,
            Err(BookingError::SlotConflict { conflict }) => {
                return Err(BookingError::SlotConflict {
                    conflict: redact_conflict(actor, conflict),
                });
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            reservation_id = %stored.id,
            turf_id = %stored.turf_id,
            date = %stored.date,
            slots = stored.slots.len(),
            "reservation created"
        );
        let expires_at = stored.expires_at(self.rules.pending_ttl_seconds);
        self.events.publish(BookingEvent::ReservationCreated {
            reservation: stored.clone(),
        });

        Ok(CreatedReservation {
            reservation: stored,
            expires_at,
        })
    }

    /// Fetch a reservation for its holder or an admin.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> BookingResult<Reservation> {
        let reservation = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(id.to_string()))?;

        if !permits(actor, Operation::ViewReservation, Some(&reservation.holder.id)) {
            return Err(BookingError::NotAuthorized("view this reservation".to_string()));
        }
        Ok(reservation)
    }

    /// Public availability for a turf and day. No holder identity.
    pub async fn booked_slots(&self, turf_id: Uuid, date: &str) -> BookingResult<Vec<BookedSlot>> {
        if !is_calendar_day(date) {
            return Err(BookingError::Validation(format!("malformed date: {date}")));
        }
        self.store.booked_slots(turf_id, date).await
    }

    /// Expiry deadline for a pending reservation under the current rules.
    pub fn expires_at(&self, reservation: &Reservation) -> DateTime<Utc> {
        reservation.expires_at(self.rules.pending_ttl_seconds)
    }
}

/// Strip the rival holder unless the caller is that holder or an admin.
fn redact_conflict(actor: &Actor, mut conflict: SlotConflict) -> SlotConflict {
    let owner_id = conflict.holder.as_ref().map(|holder| holder.id.clone());
    if !permits(actor, Operation::ViewRivalHolder, owner_id.as_deref()) {
        conflict.holder = None;
    }
    conflict
}

fn validate_request(request: &CreateReservation) -> BookingResult<()> {
    if request.slots.is_empty() {
        return Err(BookingError::Validation("at least one slot is required".to_string()));
    }
    if !is_calendar_day(&request.date) {
        return Err(BookingError::Validation(format!("malformed date: {}", request.date)));
    }
    for (index, slot) in request.slots.iter().enumerate() {
        if !slot.is_well_formed() {
            return Err(BookingError::Validation(format!("malformed slot: {slot}")));
        }
        if request.slots[..index].contains(slot) {
            return Err(BookingError::Validation(format!("duplicate slot in request: {slot}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryReservationStore, MemoryTurfCatalog};
    use pitchside_core::identity::Role;
    use pitchside_core::repository::Turf;
    use pitchside_core::reservation::ReservationStatus;

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.to_string(),
            name: format!("Actor {id}"),
            email: format!("{id}@example.com"),
            role,
        }
    }

    fn turf(price_per_hour: i64, is_approved: bool) -> Turf {
        Turf {
            id: Uuid::new_v4(),
            name: "Greenfield Arena".to_string(),
            price_per_hour,
            is_approved,
        }
    }

    fn manager_with(turfs: Vec<Turf>) -> (ReservationManager, Arc<MemoryReservationStore>) {
        let store = Arc::new(MemoryReservationStore::new());
        let catalog = Arc::new(MemoryTurfCatalog::with_turfs(turfs));
        let manager = ReservationManager::new(store.clone(), catalog, EventBus::default(), BookingRules::default());
        (manager, store)
    }

    fn request(turf_id: Uuid, slots: &[(&str, &str)]) -> CreateReservation {
        CreateReservation {
            turf_id,
            date: "2026-03-14".to_string(),
            slots: slots.iter().map(|(s, e)| Slot::new(*s, *e)).collect(),
        }
    }

    #[tokio::test]
    async fn creates_a_pending_reservation_with_computed_price() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);

        let created = manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00"), ("07:00", "08:00")]))
            .await
            .unwrap();

        assert_eq!(created.reservation.status, ReservationStatus::Pending);
        assert_eq!(created.reservation.price, 1000);
        assert_eq!(created.reservation.holder.id, "u1");
        assert_eq!(created.expires_at, created.reservation.created_at + chrono::Duration::seconds(900));
    }

    #[tokio::test]
    async fn rejects_unknown_and_unapproved_turfs() {
        let unapproved = turf(500, false);
        let unapproved_id = unapproved.id;
        let (manager, _) = manager_with(vec![unapproved]);

        let err = manager
            .create(&actor("u1", Role::User), request(unapproved_id, &[("06:00", "07:00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::TurfUnavailable(_)));

        let err = manager
            .create(&actor("u1", Role::User), request(Uuid::new_v4(), &[("06:00", "07:00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::TurfUnavailable(_)));
    }

    #[tokio::test]
    async fn validates_slots_before_touching_the_store() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);
        let caller = actor("u1", Role::User);

        let err = manager.create(&caller, request(turf_id, &[])).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let err = manager
            .create(&caller, request(turf_id, &[("07:00", "06:00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let err = manager
            .create(&caller, request(turf_id, &[("06:00", "07:00"), ("06:00", "07:00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let mut bad_date = request(turf_id, &[("06:00", "07:00")]);
        bad_date.date = "14-03-2026".to_string();
        let err = manager.create(&caller, bad_date).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn conflicting_create_reports_the_existing_reservation() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);

        let first = manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap();

        let err = manager
            .create(&actor("u2", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap_err();

        match err {
            BookingError::SlotConflict { conflict } => {
                assert_eq!(conflict.reservation_id, first.reservation.id);
                assert_eq!(conflict.slot, Slot::new("06:00", "07:00"));
            }
            other => panic!("expected SlotConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_create_is_all_or_nothing() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, store) = manager_with(vec![turf]);

        manager
            .create(&actor("u1", Role::User), request(turf_id, &[("07:00", "08:00")]))
            .await
            .unwrap();

        // second request wants a free slot and the taken one
        let err = manager
            .create(&actor("u2", Role::User), request(turf_id, &[("06:00", "07:00"), ("07:00", "08:00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotConflict { .. }));

        // the free slot in the failed batch must not have been taken
        let conflict = store
            .find_conflict(turf_id, "2026-03-14", &Slot::new("06:00", "07:00"))
            .await
            .unwrap();
        assert!(conflict.is_none());
    }

    #[tokio::test]
    async fn rival_identity_is_hidden_from_strangers() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);

        manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap();

        let err = manager
            .create(&actor("u2", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap_err();
        match err {
            BookingError::SlotConflict { conflict } => assert!(conflict.holder.is_none()),
            other => panic!("expected SlotConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rival_identity_is_shown_to_the_rival_and_admins() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);

        manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap();

        // the holder of the conflicting reservation retries and sees themselves
        let err = manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap_err();
        match err {
            BookingError::SlotConflict { conflict } => {
                assert_eq!(conflict.holder.unwrap().id, "u1");
            }
            other => panic!("expected SlotConflict, got {other:?}"),
        }

        let err = manager
            .create(&actor("a1", Role::TurfAdmin), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap_err();
        match err {
            BookingError::SlotConflict { conflict } => {
                assert_eq!(conflict.holder.unwrap().id, "u1");
            }
            other => panic!("expected SlotConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_are_gated_by_ownership() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);

        let created = manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00")]))
            .await
            .unwrap();
        let id = created.reservation.id;

        assert!(manager.get(&actor("u1", Role::User), id).await.is_ok());
        assert!(manager.get(&actor("a1", Role::TurfAdmin), id).await.is_ok());

        let err = manager.get(&actor("u2", Role::User), id).await.unwrap_err();
        assert!(matches!(err, BookingError::NotAuthorized(_)));

        let err = manager.get(&actor("u1", Role::User), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn availability_lists_slots_without_identities() {
        let turf = turf(500, true);
        let turf_id = turf.id;
        let (manager, _) = manager_with(vec![turf]);

        manager
            .create(&actor("u1", Role::User), request(turf_id, &[("06:00", "07:00"), ("09:00", "10:00")]))
            .await
            .unwrap();

        let booked = manager.booked_slots(turf_id, "2026-03-14").await.unwrap();
        assert_eq!(booked.len(), 2);
        assert!(booked.iter().all(|b| b.status == ReservationStatus::Pending));

        let err = manager.booked_slots(turf_id, "bad-date").await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn same_slot_on_other_day_or_turf_is_free() {
        let first = turf(500, true);
        let second = turf(700, true);
        let first_id = first.id;
        let second_id = second.id;
        let (manager, _) = manager_with(vec![first, second]);
        let caller = actor("u1", Role::User);

        manager.create(&caller, request(first_id, &[("06:00", "07:00")])).await.unwrap();

        // same slot, different turf
        manager.create(&caller, request(second_id, &[("06:00", "07:00")])).await.unwrap();

        // same slot and turf, different day
        let mut other_day = request(first_id, &[("06:00", "07:00")]);
        other_day.date = "2026-03-15".to_string();
        manager.create(&caller, other_day).await.unwrap();
    }
}
