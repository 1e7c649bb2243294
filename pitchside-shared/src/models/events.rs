use uuid::Uuid;

// Analytics payloads published by the side effect worker. None of these
// carry holder names or addresses.

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub reservation_id: Uuid,
    pub turf_id: Uuid,
    pub date: String,
    pub slot_count: usize,
    pub price: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentSuccessEvent {
    pub reservation_id: Uuid,
    pub turf_id: Uuid,
    pub amount: i64,
    pub transaction_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingReleasedEvent {
    pub reservation_id: Uuid,
    pub turf_id: Uuid,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingExpiredEvent {
    pub reservation_id: Uuid,
    pub turf_id: Uuid,
    pub date: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SyntheticOrderEvent {
    pub reservation_id: Uuid,
    pub order_id: String,
    pub amount_minor: i64,
    pub timestamp: i64,
}
