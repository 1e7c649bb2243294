use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use pitchside_core::BookingError;

#[derive(Debug)]
pub enum AppError {
    Booking(BookingError),
    Anyhow(anyhow::Error),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        Self::Booking(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Booking(err) => booking_response(err),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

fn booking_response(err: BookingError) -> Response {
    let status = match &err {
        BookingError::Validation(_) | BookingError::PaymentVerificationFailed => StatusCode::BAD_REQUEST,
        BookingError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        BookingError::NotFound(_) | BookingError::TurfUnavailable(_) => StatusCode::NOT_FOUND,
        BookingError::SlotConflict { .. } | BookingError::InvalidState { .. } => StatusCode::CONFLICT,
        BookingError::GatewayNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Gateway(_) => StatusCode::BAD_GATEWAY,
        BookingError::Notification(_) | BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Conflicts carry a structured body; the holder inside is already
    // redacted for the caller by the time the error reaches us.
    if let BookingError::SlotConflict { conflict } = &err {
        return (status, Json(json!({ "error": "slot conflict", "conflict": conflict }))).into_response();
    }

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Internal Server Error: {}", err);
        "Internal Server Error".to_string()
    } else {
        err.to_string()
    };

    (status, Json(json!({ "error": message }))).into_response()
}
