use crate::reservation::Reservation;
use tokio::sync::broadcast;

/// Domain events published after a state change has committed. Consumers
/// must treat them as notifications only: nothing that handles one may
/// roll the originating change back.
#[derive(Debug, Clone)]
pub enum BookingEvent {
    ReservationCreated { reservation: Reservation },
    PaymentCompleted { reservation: Reservation },
    ReservationReleased { reservation: Reservation, reason: String },
    ReservationExpired { reservation: Reservation },
    SyntheticOrderCreated { reservation: Reservation, order_id: String },
}

impl BookingEvent {
    pub fn reservation(&self) -> &Reservation {
        match self {
            Self::ReservationCreated { reservation }
            | Self::PaymentCompleted { reservation }
            | Self::ReservationReleased { reservation, .. }
            | Self::ReservationExpired { reservation }
            | Self::SyntheticOrderCreated { reservation, .. } => reservation,
        }
    }
}

/// Broadcast fan-out for post-commit events. Publishing never blocks and
/// never fails the caller path.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: BookingEvent) {
        // No subscribers is normal during tests and early startup.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
