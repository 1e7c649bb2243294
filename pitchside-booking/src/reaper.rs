use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use pitchside_core::events::{BookingEvent, EventBus};
use pitchside_core::identity::{permits, Actor, Operation};
use pitchside_core::repository::ReservationStore;
use pitchside_core::rules::BookingRules;
use pitchside_core::{BookingError, BookingResult};

/// Background sweeper that removes pending reservations whose payment
/// window has lapsed, freeing their slots for other callers.
pub struct ExpiryReaper {
    store: Arc<dyn ReservationStore>,
    rules: BookingRules,
    events: EventBus,
}

impl ExpiryReaper {
    pub fn new(store: Arc<dyn ReservationStore>, rules: BookingRules, events: EventBus) -> Self {
        Self { store, rules, events }
    }

    /// Delete every pending reservation older than the payment window.
    /// Returns how many were removed.
    pub async fn sweep(&self) -> BookingResult<u64> {
        let cutoff = Utc::now() - ChronoDuration::seconds(self.rules.pending_ttl_seconds as i64);
        let removed = self.store.delete_expired_pending(cutoff).await?;

        for reservation in &removed {
            tracing::info!(
                reservation_id = %reservation.id,
                turf_id = %reservation.turf_id,
                date = %reservation.date,
                "pending reservation expired"
            );
            self.events.publish(BookingEvent::ReservationExpired {
                reservation: reservation.clone(),
            });
        }
        Ok(removed.len() as u64)
    }

    /// On-demand sweep for operators who do not want to wait for the
    /// next interval tick.
    pub async fn cleanup_now(&self, actor: &Actor) -> BookingResult<u64> {
        if !permits(actor, Operation::ForceCleanup, None) {
            return Err(BookingError::NotAuthorized("force a cleanup sweep".to_string()));
        }
        tracing::info!(actor_id = %actor.id, "manual cleanup requested");
        self.sweep().await
    }

    /// Sweep forever at the configured interval. Spawn this once at startup.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.rules.sweep_interval_seconds));
        loop {
            ticker.tick().await;
            match self.sweep().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "expiry sweep finished"),
                Err(err) => tracing::error!(error = %err, "expiry sweep failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryReservationStore;
    use pitchside_core::identity::Role;
    use pitchside_core::reservation::{Holder, PaymentRecord, Reservation, ReservationStatus, Slot};
    use uuid::Uuid;

    fn payment_record() -> PaymentRecord {
        PaymentRecord {
            amount: 500,
            method: "synthetic".to_string(),
            transaction_id: "pay_1".to_string(),
            provider_order_id: "order_1".to_string(),
            provider_payment_id: "pay_1".to_string(),
            signature: "sig".to_string(),
            status: "completed".to_string(),
            date: Utc::now(),
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

    fn backdate(reservation: &mut Reservation, seconds: i64) {
        reservation.created_at = Utc::now() - ChronoDuration::seconds(seconds);
        reservation.updated_at = reservation.created_at;
    }

    async fn seeded(store: &MemoryReservationStore, reservation: &Reservation) {
        store.create(reservation).await.unwrap();
    }

    #[tokio::test]
    async fn removes_only_reservations_past_the_window() {
        let store = Arc::new(MemoryReservationStore::new());
        let mut stale = reservation();
        backdate(&mut stale, 1000);
        let fresh = reservation();
        seeded(&store, &stale).await;
        seeded(&store, &fresh).await;

        let reaper = ExpiryReaper::new(store.clone(), BookingRules::default(), EventBus::default());
        assert_eq!(reaper.sweep().await.unwrap(), 1);

        assert!(store.get(stale.id).await.unwrap().is_none());
        assert!(store.get(fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn paid_reservations_survive_the_sweep() {
        let store = Arc::new(MemoryReservationStore::new());
        let mut old_but_paid = reservation();
        backdate(&mut old_but_paid, 5000);
        seeded(&store, &old_but_paid).await;
        store.mark_paid(old_but_paid.id, payment_record()).await.unwrap();

        let reaper = ExpiryReaper::new(store.clone(), BookingRules::default(), EventBus::default());
        assert_eq!(reaper.sweep().await.unwrap(), 0);
        let kept = store.get(old_but_paid.id).await.unwrap().unwrap();
        assert_eq!(kept.status, ReservationStatus::Paid);
    }

    #[tokio::test]
    async fn each_removal_is_announced() {
        let store = Arc::new(MemoryReservationStore::new());
        let mut stale = reservation();
        backdate(&mut stale, 1000);
        seeded(&store, &stale).await;

        let events = EventBus::default();
        let mut receiver = events.subscribe();
        let reaper = ExpiryReaper::new(store, BookingRules::default(), events);
        reaper.sweep().await.unwrap();

        match receiver.try_recv().unwrap() {
            BookingEvent::ReservationExpired { reservation } => assert_eq!(reservation.id, stale.id),
            other => panic!("expected ReservationExpired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn manual_cleanup_is_for_super_admins_only() {
        let store = Arc::new(MemoryReservationStore::new());
        let reaper = ExpiryReaper::new(store, BookingRules::default(), EventBus::default());

        let operator = Actor {
            id: "root".to_string(),
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::SuperAdmin,
        };
        assert_eq!(reaper.cleanup_now(&operator).await.unwrap(), 0);

        let turf_admin = Actor {
            role: Role::TurfAdmin,
            ..operator.clone()
        };
        let err = reaper.cleanup_now(&turf_admin).await.unwrap_err();
        assert!(matches!(err, BookingError::NotAuthorized(_)));
    }
}
