use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Paid,
    Cancelled,
}

impl ReservationStatus {
    /// Statuses that keep a slot occupied. `Confirmed` is a legacy active
    /// status: no transition here produces it, but stored records carrying
    /// it still block their slots.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Paid)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

/// A bookable window within a day. Times are opaque zero-padded "HH:MM"
/// strings compared byte-wise; no timezone arithmetic is ever applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub start_time: String,
    pub end_time: String,
}

impl Slot {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Both times are well-shaped clock strings and the window is forward.
    pub fn is_well_formed(&self) -> bool {
        is_clock_time(&self.start_time) && is_clock_time(&self.end_time) && self.start_time < self.end_time
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_time, self.end_time)
    }
}

fn is_clock_time(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hour <= 23 && minute <= 59
}

/// Opaque calendar-day string, "YYYY-MM-DD". Shape check only; the value
/// is never parsed into a timestamp.
pub fn is_calendar_day(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() })
}

/// The person a reservation belongs to. Name and email are denormalized
/// onto the record so conflict messages and notifications need no user
/// service lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Holder {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Payment evidence attached by the verification handler. Present exactly
/// when the reservation is paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: i64,
    pub method: String,
    pub transaction_id: String,
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub signature: String,
    pub status: String,
    pub date: DateTime<Utc>,
}

/// The single source of truth for a booked turf slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub holder: Holder,
    pub turf_id: Uuid,
    pub date: String,
    pub slots: Vec<Slot>,
    pub price: i64,
    pub status: ReservationStatus,
    pub payment: Option<PaymentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(holder: Holder, turf_id: Uuid, date: String, slots: Vec<Slot>, price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            holder,
            turf_id,
            date,
            slots,
            price,
            status: ReservationStatus::Pending,
            payment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update reservation status
    pub fn update_status(&mut self, new_status: ReservationStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    /// When a pending reservation falls to the reaper. Derived from
    /// `created_at`, never stored.
    pub fn expires_at(&self, pending_ttl_seconds: u64) -> DateTime<Utc> {
        self.created_at + Duration::seconds(pending_ttl_seconds as i64)
    }
}

/// What an attempted booking collided with. The store always fills the
/// holder; the manager strips it before the error leaves the engine
/// unless the caller may see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConflict {
    pub reservation_id: Uuid,
    pub turf_id: Uuid,
    pub date: String,
    pub slot: Slot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<Holder>,
}

/// Public availability projection. Carries no holder identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedSlot {
    pub slot: Slot,
    pub status: ReservationStatus,
}
