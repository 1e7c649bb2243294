use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use pitchside_booking::payments::PaymentCallback;
use pitchside_core::payment::GatewayOrder;

use crate::error::AppError;
use crate::identity::CallerIdentity;
use crate::reservations::ReservationResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations/{id}/order", post(create_payment_order))
        .route("/v1/payments/verify", post(verify_payment))
}

async fn create_payment_order(
    State(state): State<AppState>,
    CallerIdentity(actor): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<GatewayOrder>, AppError> {
    let order = state.payments.create_order(&actor, id).await?;
    Ok(Json(order))
}

/// Callback endpoint for the gateway checkout flow. Deliberately takes
/// no caller identity: the HMAC signature over the order and payment
/// ids is the proof of authenticity.
async fn verify_payment(
    State(state): State<AppState>,
    Json(callback): Json<PaymentCallback>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation = state.payments.verify(callback).await?;
    Ok(Json(ReservationResponse {
        reservation,
        expires_at: None,
    }))
}
