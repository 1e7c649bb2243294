use pitchside_core::reservation::Reservation;
use pitchside_core::sinks::{Receipt, ReceiptGenerator};
use pitchside_core::{BookingError, BookingResult};

/// Plain-text receipt attached to confirmation mail.
pub struct TextReceiptGenerator {
    currency: String,
}

impl TextReceiptGenerator {
    pub fn new(currency: String) -> Self {
        Self { currency }
    }
}

impl ReceiptGenerator for TextReceiptGenerator {
    fn generate(&self, reservation: &Reservation) -> BookingResult<Receipt> {
        let payment = reservation.payment.as_ref().ok_or_else(|| BookingError::InvalidState {
            current: reservation.status.to_string(),
            requested: "receipt".to_string(),
        })?;

        let slots = reservation
            .slots
            .iter()
            .map(|slot| slot.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let body = format!(
            "BOOKING RECEIPT\n\n\
             Reservation: {}\n\
             Booked by: {}\n\
             Date: {}\n\
             Slots: {}\n\
             Amount: {} {}\n\
             Payment method: {}\n\
             Transaction: {}\n\
             Paid at: {}\n",
            reservation.id,
            reservation.holder.name,
            reservation.date,
            slots,
            payment.amount,
            self.currency,
            payment.method,
            payment.transaction_id,
            payment.date.to_rfc3339(),
        );

        Ok(Receipt {
            filename: format!("receipt-{}.txt", reservation.id.simple()),
            content_type: "text/plain".to_string(),
            bytes: body.into_bytes(),
        })
    }
}
