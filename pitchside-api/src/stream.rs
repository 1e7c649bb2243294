use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use pitchside_core::events::BookingEvent;
use pitchside_core::reservation::Slot;

use crate::state::AppState;

/// Slot-level change pushed to availability watchers. Deliberately
/// carries no holder identity; anyone may subscribe.
#[derive(Debug, Clone, Serialize)]
pub struct SlotUpdate {
    pub turf_id: Uuid,
    pub date: String,
    pub slots: Vec<Slot>,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub date: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/turfs/{turf_id}/stream", get(slot_stream))
}

/// Map a booking event onto the public slot feed. Synthetic order
/// events are gateway plumbing and are not slot changes.
pub(crate) fn project(event: &BookingEvent) -> Option<SlotUpdate> {
    let state = match event {
        BookingEvent::ReservationCreated { .. } => "held",
        BookingEvent::PaymentCompleted { .. } => "booked",
        BookingEvent::ReservationReleased { .. } | BookingEvent::ReservationExpired { .. } => "released",
        BookingEvent::SyntheticOrderCreated { .. } => return None,
    };
    let reservation = event.reservation();
    Some(SlotUpdate {
        turf_id: reservation.turf_id,
        date: reservation.date.clone(),
        slots: reservation.slots.clone(),
        state: state.to_string(),
    })
}

async fn slot_stream(
    State(state): State<AppState>,
    Path(turf_id): Path<Uuid>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.events.subscribe();
    let date = query.date;

    let stream = BroadcastStream::new(receiver).filter_map(move |event| {
        let update = match event {
            Ok(event) if event.reservation().turf_id == turf_id => {
                project(&event).filter(|update| date.as_ref().is_none_or(|d| *d == update.date))
            }
            // A lagged subscriber just picks up from the next event.
            _ => None,
        };
        futures_util::future::ready(update.map(|update| Event::default().event("slots").json_data(&update)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchside_core::reservation::{Holder, Reservation};

    fn reservation() -> Reservation {
        let holder = Holder {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        };
        Reservation::new(
            holder,
            Uuid::new_v4(),
            "2026-03-14".to_string(),
            vec![Slot::new("06:00", "07:00")],
            500,
        )
    }

    #[test]
    fn lifecycle_events_map_to_slot_states() {
        let reservation = reservation();
        let held = project(&BookingEvent::ReservationCreated {
            reservation: reservation.clone(),
        })
        .unwrap();
        assert_eq!(held.state, "held");
        assert_eq!(held.turf_id, reservation.turf_id);

        let booked = project(&BookingEvent::PaymentCompleted {
            reservation: reservation.clone(),
        })
        .unwrap();
        assert_eq!(booked.state, "booked");

        let released = project(&BookingEvent::ReservationReleased {
            reservation: reservation.clone(),
            reason: "test".to_string(),
        })
        .unwrap();
        assert_eq!(released.state, "released");

        let expired = project(&BookingEvent::ReservationExpired {
            reservation: reservation.clone(),
        })
        .unwrap();
        assert_eq!(expired.state, "released");
    }

    #[test]
    fn synthetic_orders_stay_off_the_feed() {
        let update = project(&BookingEvent::SyntheticOrderCreated {
            reservation: reservation(),
            order_id: "order_synth_1".to_string(),
        });
        assert!(update.is_none());
    }

    #[test]
    fn updates_never_expose_the_holder() {
        let update = project(&BookingEvent::PaymentCompleted {
            reservation: reservation(),
        })
        .unwrap();
        let rendered = serde_json::to_string(&update).unwrap();
        assert!(!rendered.contains("Asha"));
        assert!(!rendered.contains("asha@example.com"));
        assert!(!rendered.contains("holder"));
    }
}
