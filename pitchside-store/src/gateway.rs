use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use pitchside_core::payment::{GatewayOrder, OrderRequest, PaymentProvider};
use pitchside_core::{BookingError, BookingResult};
use pitchside_shared::pii::masked_preview;

/// Razorpay-style REST gateway client. Orders are opened with a POST to
/// `{base_url}/orders` under basic auth.
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentProvider {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            key_id,
            key_secret,
        }
    }
}

impl fmt::Debug for HttpPaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPaymentProvider")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &masked_preview(&self.key_secret))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GatewayOrderBody {
    id: String,
    amount: i64,
    currency: String,
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn create_order(&self, request: &OrderRequest) -> BookingResult<GatewayOrder> {
        let url = format!("{}/orders", self.base_url);
        let body = serde_json::json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "receipt": request.receipt,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| BookingError::Gateway(format!("order request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BookingError::Gateway(format!("order request returned {status}: {text}")));
        }

        let order: GatewayOrderBody = response
            .json()
            .await
            .map_err(|e| BookingError::Gateway(format!("malformed order response: {e}")))?;

        Ok(GatewayOrder {
            order_id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            synthetic: false,
        })
    }
}
