use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use pitchside_core::events::{BookingEvent, EventBus};
use pitchside_core::identity::{permits, Actor, Operation};
use pitchside_core::payment::{GatewayOrder, OrderRequest, PaymentProvider};
use pitchside_core::repository::ReservationStore;
use pitchside_core::reservation::{PaymentRecord, Reservation, ReservationStatus};
use pitchside_core::{BookingError, BookingResult};

use crate::signature::SignatureVerifier;

/// Callback fields posted by the gateway (or its checkout page) after the
/// customer pays. The signature is the proof of authenticity.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    pub reservation_id: Uuid,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Drives a reservation through the gateway order and verification steps.
pub struct PaymentManager {
    store: Arc<dyn ReservationStore>,
    provider: Option<Arc<dyn PaymentProvider>>,
    verifier: Option<SignatureVerifier>,
    events: EventBus,
    allow_synthetic_orders: bool,
    currency: String,
}

impl PaymentManager {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        provider: Option<Arc<dyn PaymentProvider>>,
        verifier: Option<SignatureVerifier>,
        events: EventBus,
        allow_synthetic_orders: bool,
        currency: String,
    ) -> Self {
        Self {
            store,
            provider,
            verifier,
            events,
            allow_synthetic_orders,
            currency,
        }
    }

    /// Open a gateway order for a pending reservation. The amount is taken
    /// from the stored reservation, never from the caller.
    pub async fn create_order(&self, actor: &Actor, reservation_id: Uuid) -> BookingResult<GatewayOrder> {
        let reservation = self
            .store
            .get(reservation_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(reservation_id.to_string()))?;

        if !permits(actor, Operation::ViewReservation, Some(&reservation.holder.id)) {
            return Err(BookingError::NotAuthorized("pay for this reservation".to_string()));
        }
        if reservation.status != ReservationStatus::Pending {
            return Err(BookingError::InvalidState {
                current: reservation.status.to_string(),
                requested: "order".to_string(),
            });
        }

        let request = OrderRequest {
            reservation_id,
            amount_minor: reservation.price * 100,
            currency: self.currency.clone(),
            receipt: format!("resv_{}", reservation_id.simple()),
        };

        match &self.provider {
            Some(provider) => {
                let order = provider.create_order(&request).await?;
                tracing::info!(
                    reservation_id = %reservation_id,
                    order_id = %order.order_id,
                    amount_minor = order.amount_minor,
                    provider = provider.name(),
                    "gateway order created"
                );
                Ok(order)
            }
            None if self.allow_synthetic_orders => {
                let order = GatewayOrder {
                    order_id: format!("order_synth_{}", Uuid::new_v4().simple()),
                    amount_minor: request.amount_minor,
                    currency: request.currency,
                    synthetic: true,
                };
                tracing::warn!(
                    reservation_id = %reservation_id,
                    order_id = %order.order_id,
                    "no gateway configured, issuing synthetic order"
                );
                self.events.publish(BookingEvent::SyntheticOrderCreated {
                    reservation: reservation.clone(),
                    order_id: order.order_id.clone(),
                });
                Ok(order)
            }
            None => Err(BookingError::GatewayNotConfigured),
        }
    }

    /// Verify a payment callback and mark the reservation paid.
    ///
    /// The caller carries no identity here: a valid signature over the
    /// order and payment ids is itself the proof that the gateway spoke.
    pub async fn verify(&self, callback: PaymentCallback) -> BookingResult<Reservation> {
        let verifier = self.verifier.as_ref().ok_or(BookingError::GatewayNotConfigured)?;
        if !verifier.verify(&callback.order_id, &callback.payment_id, &callback.signature) {
            tracing::warn!(
                reservation_id = %callback.reservation_id,
                order_id = %callback.order_id,
                "payment signature rejected"
            );
            return Err(BookingError::PaymentVerificationFailed);
        }

        let reservation = self
            .store
            .get(callback.reservation_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(callback.reservation_id.to_string()))?;

        let method = self
            .provider
            .as_ref()
            .map(|provider| provider.name().to_string())
            .unwrap_or_else(|| "synthetic".to_string());
        let record = PaymentRecord {
            amount: reservation.price,
            method,
            transaction_id: callback.payment_id.clone(),
            provider_order_id: callback.order_id.clone(),
            provider_payment_id: callback.payment_id.clone(),
            signature: callback.signature.clone(),
            status: "completed".to_string(),
            date: Utc::now(),
        };

        let paid = self.store.mark_paid(callback.reservation_id, record).await?;
        tracing::info!(
            reservation_id = %paid.id,
            transaction_id = %callback.payment_id,
            amount = paid.price,
            "payment verified, reservation paid"
        );
        self.events.publish(BookingEvent::PaymentCompleted {
            reservation: paid.clone(),
        });
        Ok(paid)
    }
}
