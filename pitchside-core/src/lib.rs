pub mod events;
pub mod identity;
pub mod payment;
pub mod repository;
pub mod reservation;
pub mod rules;
pub mod sinks;

use reservation::SlotConflict;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("slot {} on {} is already booked", .conflict.slot, .conflict.date)]
    SlotConflict { conflict: SlotConflict },

    #[error("turf not available: {0}")]
    TurfUnavailable(String),

    #[error("reservation not found: {0}")]
    NotFound(String),

    #[error("not authorized to {0}")]
    NotAuthorized(String),

    #[error("operation not allowed: reservation is {current}, requested {requested}")]
    InvalidState { current: String, requested: String },

    #[error("payment signature verification failed")]
    PaymentVerificationFailed,

    #[error("payment gateway is not configured")]
    GatewayNotConfigured,

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("storage error: {0}")]
    Store(String),
}

pub type BookingResult<T> = Result<T, BookingError>;
