use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::CallerIdentity;
use crate::reservations::ReservationResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/reservations/{id}/release", post(release_reservation))
        .route("/v1/admin/cleanup", post(force_cleanup))
}

async fn release_reservation(
    State(state): State<AppState>,
    CallerIdentity(actor): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<ReleaseRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let released = state.admin.release(&actor, id, request.reason).await?;
    Ok(Json(ReservationResponse {
        reservation: released,
        expires_at: None,
    }))
}

async fn force_cleanup(
    State(state): State<AppState>,
    CallerIdentity(actor): CallerIdentity,
) -> Result<Json<CleanupResponse>, AppError> {
    let removed = state.reaper.cleanup_now(&actor).await?;
    Ok(Json(CleanupResponse { removed }))
}
