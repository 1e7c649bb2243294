use std::sync::Arc;

use pitchside_booking::{AdminManager, ExpiryReaper, PaymentManager, ReservationManager};
use pitchside_core::events::EventBus;
use pitchside_store::RedisClient;

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationManager>,
    pub payments: Arc<PaymentManager>,
    pub admin: Arc<AdminManager>,
    pub reaper: Arc<ExpiryReaper>,
    pub events: EventBus,
    /// Absent in tests; rate limiting is skipped without it.
    pub redis: Option<Arc<RedisClient>>,
}
