use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BookingResult;

/// Order creation request sent to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub reservation_id: Uuid,
    /// Amount in minor currency units (paise, cents).
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}

/// Gateway-side order handed back to the client to complete checkout.
/// `synthetic` marks orders minted locally because no gateway is
/// configured; clients must surface that state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub synthetic: bool,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider name recorded as the payment method on paid reservations.
    fn name(&self) -> &str;

    /// Create a provider-side order for the given amount.
    async fn create_order(&self, request: &OrderRequest) -> BookingResult<GatewayOrder>;
}
