pub mod app_config;
pub mod audit_repo;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod gateway;
pub mod notify;
pub mod receipt;
pub mod redis_repo;
pub mod reservation_repo;

pub use database::DbClient;
pub use events::EventProducer;
pub use redis_repo::RedisClient;

pub(crate) fn store_err(err: impl std::fmt::Display) -> pitchside_core::BookingError {
    pitchside_core::BookingError::Store(err.to_string())
}
