use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pitchside_booking::manager::CreateReservation;
use pitchside_core::reservation::{BookedSlot, Reservation, ReservationStatus};
use pitchside_core::BookingError;

use crate::error::AppError;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Reservation as returned over the API. `expires_at` is only present
/// while the payment window is still running.
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    #[serde(flatten)]
    pub reservation: Reservation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub turf_id: Uuid,
    pub date: String,
    pub booked: Vec<BookedSlot>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations", post(create_reservation))
        .route("/v1/reservations/{id}", get(get_reservation))
        .route("/v1/turfs/{turf_id}/availability", get(turf_availability))
}

async fn create_reservation(
    State(state): State<AppState>,
    CallerIdentity(actor): CallerIdentity,
    Json(request): Json<CreateReservation>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    if actor.id.is_empty() {
        return Err(BookingError::NotAuthorized("create a reservation".to_string()).into());
    }
    let created = state.reservations.create(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            reservation: created.reservation,
            expires_at: Some(created.expires_at),
        }),
    ))
}

async fn get_reservation(
    State(state): State<AppState>,
    CallerIdentity(actor): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation = state.reservations.get(&actor, id).await?;
    let expires_at =
        (reservation.status == ReservationStatus::Pending).then(|| state.reservations.expires_at(&reservation));
    Ok(Json(ReservationResponse { reservation, expires_at }))
}

async fn turf_availability(
    State(state): State<AppState>,
    Path(turf_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let booked = state.reservations.booked_slots(turf_id, &query.date).await?;
    Ok(Json(AvailabilityResponse {
        turf_id,
        date: query.date,
        booked,
    }))
}
