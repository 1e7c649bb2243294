use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use pitchside_core::events::{BookingEvent, EventBus};
use pitchside_core::identity::{permits, Actor, Operation};
use pitchside_core::repository::ReservationStore;
use pitchside_core::reservation::Reservation;
use pitchside_core::sinks::{AuditEntry, AuditSink};
use pitchside_core::{BookingError, BookingResult};

const DEFAULT_RELEASE_REASON: &str = "released by admin";

/// Administrative overrides. Every override leaves an audit entry.
pub struct AdminManager {
    store: Arc<dyn ReservationStore>,
    audit: Arc<dyn AuditSink>,
    events: EventBus,
}

impl AdminManager {
    pub fn new(store: Arc<dyn ReservationStore>, audit: Arc<dyn AuditSink>, events: EventBus) -> Self {
        Self { store, audit, events }
    }

    /// Cancel a pending reservation and free its slots. Every other
    /// status comes back as `InvalidState`.
    pub async fn release(&self, actor: &Actor, id: Uuid, reason: Option<String>) -> BookingResult<Reservation> {
        if !permits(actor, Operation::ReleaseReservation, None) {
            return Err(BookingError::NotAuthorized("release a reservation".to_string()));
        }
        let reason = reason.unwrap_or_else(|| DEFAULT_RELEASE_REASON.to_string());
        let prior = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(id.to_string()))?;
        let released = self.store.mark_cancelled(id).await?;

        tracing::info!(
            reservation_id = %released.id,
            actor_id = %actor.id,
            reason = %reason,
            "reservation released"
        );
        let entry = AuditEntry::new(
            "release",
            actor,
            Some(id),
            json!({ "reason": reason, "prior_status": prior.status.to_string() }),
        );
        // The release is already committed; a lost audit row is logged, not retried.
        if let Err(err) = self.audit.record(entry).await {
            tracing::error!(reservation_id = %id, error = %err, "failed to record release audit entry");
        }
        self.events.publish(BookingEvent::ReservationReleased {
            reservation: released.clone(),
            reason,
        });
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAuditSink, MemoryReservationStore};
    use chrono::Utc;
    use pitchside_core::identity::Role;
    use pitchside_core::reservation::{Holder, PaymentRecord, Reservation, ReservationStatus, Slot};

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.to_string(),
            name: format!("Actor {id}"),
            email: format!("{id}@example.com"),
            role,
        }
    }

    fn reservation() -> Reservation {
        let holder = Holder {
            id: "u1".to_string(),
            name: "Holder".to_string(),
            email: "u1@example.com".to_string(),
        };
        Reservation::new(
            holder,
            Uuid::new_v4(),
            "2026-03-14".to_string(),
            vec![Slot::new("06:00", "07:00")],
            500,
        )
    }

    fn harness() -> (AdminManager, Arc<MemoryReservationStore>, Arc<MemoryAuditSink>) {
        let store = Arc::new(MemoryReservationStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let manager = AdminManager::new(store.clone(), audit.clone(), EventBus::default());
        (manager, store, audit)
    }

    #[tokio::test]
    async fn release_cancels_and_audits() {
        let (manager, store, audit) = harness();
        let target = reservation();
        store.create(&target).await.unwrap();

        let released = manager
            .release(&actor("a1", Role::TurfAdmin), target.id, Some("double booking".to_string()))
            .await
            .unwrap();
        assert_eq!(released.status, ReservationStatus::Cancelled);

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "release");
        assert_eq!(entries[0].actor_id, "a1");
        assert_eq!(entries[0].target, Some(target.id));
        assert_eq!(entries[0].meta["reason"], "double booking");
        assert_eq!(entries[0].meta["prior_status"], "pending");
    }

    #[tokio::test]
    async fn release_without_a_reason_uses_the_default() {
        let (manager, store, audit) = harness();
        let target = reservation();
        store.create(&target).await.unwrap();

        manager.release(&actor("a1", Role::SuperAdmin), target.id, None).await.unwrap();
        assert_eq!(audit.entries()[0].meta["reason"], DEFAULT_RELEASE_REASON);
    }

    #[tokio::test]
    async fn release_frees_the_slot_for_others() {
        let (manager, store, _) = harness();
        let target = reservation();
        store.create(&target).await.unwrap();

        manager.release(&actor("a1", Role::TurfAdmin), target.id, None).await.unwrap();

        let conflict = store
            .find_conflict(target.turf_id, &target.date, &Slot::new("06:00", "07:00"))
            .await
            .unwrap();
        assert!(conflict.is_none());
    }

    #[tokio::test]
    async fn ordinary_users_cannot_release() {
        let (manager, store, audit) = harness();
        let target = reservation();
        store.create(&target).await.unwrap();

        let err = manager.release(&actor("u2", Role::User), target.id, None).await.unwrap_err();
        assert!(matches!(err, BookingError::NotAuthorized(_)));
        assert!(audit.entries().is_empty());
        assert_eq!(
            store.get(target.id).await.unwrap().unwrap().status,
            ReservationStatus::Pending
        );
    }

    #[tokio::test]
    async fn paid_reservations_are_terminal() {
        let (manager, store, audit) = harness();
        let target = reservation();
        store.create(&target).await.unwrap();
        let record = PaymentRecord {
            amount: 500,
            method: "synthetic".to_string(),
            transaction_id: "pay_1".to_string(),
            provider_order_id: "order_1".to_string(),
            provider_payment_id: "pay_1".to_string(),
            signature: "sig".to_string(),
            status: "completed".to_string(),
            date: Utc::now(),
        };
        store.mark_paid(target.id, record).await.unwrap();

        let err = manager
            .release(&actor("a1", Role::SuperAdmin), target.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { .. }));
        assert!(audit.entries().is_empty());
    }

    #[tokio::test]
    async fn confirmed_reservations_cannot_be_released() {
        let (manager, store, audit) = harness();
        let mut target = reservation();
        target.status = ReservationStatus::Confirmed;
        store.create(&target).await.unwrap();

        let err = manager
            .release(&actor("a1", Role::TurfAdmin), target.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { .. }));
        assert!(audit.entries().is_empty());
        assert_eq!(
            store.get(target.id).await.unwrap().unwrap().status,
            ReservationStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn releasing_a_missing_reservation_is_not_found() {
        let (manager, _, _) = harness();
        let err = manager
            .release(&actor("a1", Role::TurfAdmin), Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }
}
