use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;

use pitchside_core::events::{BookingEvent, EventBus};
use pitchside_core::reservation::Reservation;
use pitchside_core::sinks::{AnalyticsSink, Notification, NotificationSender, ReceiptGenerator};
use pitchside_shared::models::events::{
    BookingCreatedEvent, BookingExpiredEvent, BookingReleasedEvent, PaymentSuccessEvent, SyntheticOrderEvent,
};

/// Consumes booking events and performs the follow-on work: analytics
/// records for every event, plus a confirmation mail on payment. All of
/// it is best effort; nothing here can undo a committed booking.
pub struct SideEffectWorker {
    events: EventBus,
    notifier: Arc<dyn NotificationSender>,
    analytics: Arc<dyn AnalyticsSink>,
    receipts: Arc<dyn ReceiptGenerator>,
}

impl SideEffectWorker {
    pub fn new(
        events: EventBus,
        notifier: Arc<dyn NotificationSender>,
        analytics: Arc<dyn AnalyticsSink>,
        receipts: Arc<dyn ReceiptGenerator>,
    ) -> Self {
        Self {
            events,
            notifier,
            analytics,
            receipts,
        }
    }

    /// Drain the event bus until every sender is gone.
    pub async fn run(self: Arc<Self>) {
        let mut receiver = self.events.subscribe();
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle(event).await,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "side effect worker lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    pub async fn handle(&self, event: BookingEvent) {
        match event {
            BookingEvent::ReservationCreated { reservation } => {
                self.record(
                    "booking_created",
                    &BookingCreatedEvent {
                        reservation_id: reservation.id,
                        turf_id: reservation.turf_id,
                        date: reservation.date.clone(),
                        slot_count: reservation.slots.len(),
                        price: reservation.price,
                        timestamp: Utc::now().timestamp(),
                    },
                )
                .await;
            }
            BookingEvent::PaymentCompleted { reservation } => {
                let payment = reservation.payment.as_ref();
                self.record(
                    "payment_success",
                    &PaymentSuccessEvent {
                        reservation_id: reservation.id,
                        turf_id: reservation.turf_id,
                        amount: payment.map(|p| p.amount).unwrap_or(reservation.price),
                        transaction_id: payment.map(|p| p.transaction_id.clone()).unwrap_or_default(),
                        timestamp: Utc::now().timestamp(),
                    },
                )
                .await;
                self.send_confirmation(&reservation).await;
            }
            BookingEvent::ReservationReleased { reservation, reason } => {
                self.record(
                    "booking_released",
                    &BookingReleasedEvent {
                        reservation_id: reservation.id,
                        turf_id: reservation.turf_id,
                        reason,
                        timestamp: Utc::now().timestamp(),
                    },
                )
                .await;
            }
            BookingEvent::ReservationExpired { reservation } => {
                self.record(
                    "booking_expired",
                    &BookingExpiredEvent {
                        reservation_id: reservation.id,
                        turf_id: reservation.turf_id,
                        date: reservation.date.clone(),
                        timestamp: Utc::now().timestamp(),
                    },
                )
                .await;
            }
            BookingEvent::SyntheticOrderCreated { reservation, order_id } => {
                self.record(
                    "synthetic_order",
                    &SyntheticOrderEvent {
                        reservation_id: reservation.id,
                        order_id,
                        amount_minor: reservation.price * 100,
                        timestamp: Utc::now().timestamp(),
                    },
                )
                .await;
            }
        }
    }

    async fn record<T: Serialize>(&self, event: &str, payload: &T) {
        let payload = serde_json::to_value(payload).unwrap_or(Value::Null);
        if let Err(err) = self.analytics.record(event, payload).await {
            tracing::warn!(event, error = %err, "analytics record dropped");
        }
    }

    async fn send_confirmation(&self, reservation: &Reservation) {
        if reservation.holder.email.is_empty() {
            tracing::warn!(reservation_id = %reservation.id, "holder has no email, skipping confirmation");
            return;
        }

        let attachment = match self.receipts.generate(reservation) {
            Ok(receipt) => Some(receipt),
            Err(err) => {
                tracing::warn!(reservation_id = %reservation.id, error = %err, "receipt generation failed, sending mail without it");
                None
            }
        };

        let slots = reservation
            .slots
            .iter()
            .map(|slot| slot.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let notification = Notification {
            to: reservation.holder.email.clone(),
            subject: format!("Booking confirmed for {}", reservation.date),
            body_text: format!(
                "Hi {},\n\nYour booking on {} is confirmed.\nSlots: {}\nAmount paid: {}\n\nSee you on the pitch!",
                reservation.holder.name, reservation.date, slots, reservation.price
            ),
            attachment,
        };
        if let Err(err) = self.notifier.send(notification).await {
            tracing::warn!(reservation_id = %reservation.id, error = %err, "confirmation mail failed");
        }
    }
}
