use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use pitchside_core::repository::{ReservationStore, Turf, TurfCatalog};
use pitchside_core::reservation::{BookedSlot, PaymentRecord, Reservation, ReservationStatus, Slot, SlotConflict};
use pitchside_core::sinks::{AnalyticsSink, AuditEntry, AuditSink, Notification, NotificationSender};
use pitchside_core::{BookingError, BookingResult};

/// In-memory reservation store. A single mutex over the whole map gives
/// the same first-writer-wins behavior the database store gets from its
/// transaction, which is what the engine tests rely on.
#[derive(Default)]
pub struct MemoryReservationStore {
    reservations: Mutex<HashMap<Uuid, Reservation>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, HashMap<Uuid, Reservation>> {
        self.reservations.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn conflict_in(
    reservations: &HashMap<Uuid, Reservation>,
    turf_id: Uuid,
    date: &str,
    slot: &Slot,
) -> Option<SlotConflict> {
    reservations
        .values()
        .find(|r| r.turf_id == turf_id && r.date == date && r.status.is_active() && r.slots.contains(slot))
        .map(|r| SlotConflict {
            reservation_id: r.id,
            turf_id: r.turf_id,
            date: r.date.clone(),
            slot: slot.clone(),
            holder: Some(r.holder.clone()),
        })
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn create(&self, reservation: &Reservation) -> BookingResult<Reservation> {
        let mut reservations = self.locked();
        for slot in &reservation.slots {
            if let Some(conflict) = conflict_in(&reservations, reservation.turf_id, &reservation.date, slot) {
                return Err(BookingError::SlotConflict { conflict });
            }
        }
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation.clone())
    }

    async fn get(&self, id: Uuid) -> BookingResult<Option<Reservation>> {
        Ok(self.locked().get(&id).cloned())
    }

    async fn find_conflict(&self, turf_id: Uuid, date: &str, slot: &Slot) -> BookingResult<Option<SlotConflict>> {
        Ok(conflict_in(&self.locked(), turf_id, date, slot))
    }

    async fn booked_slots(&self, turf_id: Uuid, date: &str) -> BookingResult<Vec<BookedSlot>> {
        let reservations = self.locked();
        let mut booked: Vec<BookedSlot> = reservations
            .values()
            .filter(|r| r.turf_id == turf_id && r.date == date && r.status.is_active())
            .flat_map(|r| {
                r.slots.iter().map(|slot| BookedSlot {
                    slot: slot.clone(),
                    status: r.status,
                })
            })
            .collect();
        booked.sort_by(|a, b| a.slot.start_time.cmp(&b.slot.start_time));
        Ok(booked)
    }

    async fn mark_paid(&self, id: Uuid, payment: PaymentRecord) -> BookingResult<Reservation> {
        let mut reservations = self.locked();
        let reservation = reservations
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(id.to_string()))?;
        if reservation.status != ReservationStatus::Pending {
            return Err(BookingError::InvalidState {
                current: reservation.status.to_string(),
                requested: ReservationStatus::Paid.to_string(),
            });
        }
        reservation.payment = Some(payment);
        reservation.update_status(ReservationStatus::Paid);
        Ok(reservation.clone())
    }

    async fn mark_cancelled(&self, id: Uuid) -> BookingResult<Reservation> {
        let mut reservations = self.locked();
        let reservation = reservations
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(id.to_string()))?;
        if reservation.status != ReservationStatus::Pending {
            return Err(BookingError::InvalidState {
                current: reservation.status.to_string(),
                requested: ReservationStatus::Cancelled.to_string(),
            });
        }
        reservation.update_status(ReservationStatus::Cancelled);
        Ok(reservation.clone())
    }

    async fn delete_expired_pending(&self, cutoff: DateTime<Utc>) -> BookingResult<Vec<Reservation>> {
        let mut reservations = self.locked();
        let expired: Vec<Uuid> = reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Pending && r.created_at < cutoff)
            .map(|r| r.id)
            .collect();
        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(reservation) = reservations.remove(&id) {
                removed.push(reservation);
            }
        }
        Ok(removed)
    }
}

/// In-memory turf catalog for tests and demos.
#[derive(Default)]
pub struct MemoryTurfCatalog {
    turfs: Mutex<HashMap<Uuid, Turf>>,
}

impl MemoryTurfCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turfs(turfs: Vec<Turf>) -> Self {
        let catalog = Self::new();
        {
            let mut guard = catalog.turfs.lock().unwrap_or_else(|e| e.into_inner());
            for turf in turfs {
                guard.insert(turf.id, turf);
            }
        }
        catalog
    }

    pub fn add(&self, turf: Turf) {
        self.turfs.lock().unwrap_or_else(|e| e.into_inner()).insert(turf.id, turf);
    }
}

#[async_trait]
impl TurfCatalog for MemoryTurfCatalog {
    async fn get_turf(&self, turf_id: Uuid) -> BookingResult<Option<Turf>> {
        Ok(self.turfs.lock().unwrap_or_else(|e| e.into_inner()).get(&turf_id).cloned())
    }
}

/// Collects audit entries in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> BookingResult<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).push(entry);
        Ok(())
    }
}

/// Collects analytics records in memory.
#[derive(Default)]
pub struct MemoryAnalyticsSink {
    records: Mutex<Vec<(String, Value)>>,
}

impl MemoryAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, Value)> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AnalyticsSink for MemoryAnalyticsSink {
    async fn record(&self, event: &str, payload: Value) -> BookingResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((event.to_string(), payload));
        Ok(())
    }
}

/// Collects outbound notifications in memory.
#[derive(Default)]
pub struct MemoryNotificationSender {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl NotificationSender for MemoryNotificationSender {
    async fn send(&self, notification: Notification) -> BookingResult<()> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(notification);
        Ok(())
    }
}
