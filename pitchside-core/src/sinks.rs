use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::identity::Actor;
use crate::reservation::Reservation;
use crate::BookingResult;

/// Outbound email. The attachment, when present, is a generated receipt.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub attachment: Option<Receipt>,
}

/// Generated booking artifact attached to confirmation mail.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification) -> BookingResult<()>;
}

/// Append-only record of a privileged action. Entries are written once
/// and never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: String,
    pub actor_id: String,
    pub actor_role: String,
    pub target: Option<Uuid>,
    pub meta: Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: &str, actor: &Actor, target: Option<Uuid>, meta: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.to_string(),
            actor_id: actor.id.clone(),
            actor_role: actor.role.to_string(),
            target,
            meta,
            recorded_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> BookingResult<()>;
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: &str, payload: Value) -> BookingResult<()>;
}

pub trait ReceiptGenerator: Send + Sync {
    fn generate(&self, reservation: &Reservation) -> BookingResult<Receipt>;
}
