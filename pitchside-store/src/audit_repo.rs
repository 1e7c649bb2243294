use async_trait::async_trait;
use sqlx::PgPool;

use pitchside_core::sinks::{AuditEntry, AuditSink};
use pitchside_core::BookingResult;

use crate::store_err;

/// Audit trail writer. This type only inserts; nothing in the codebase
/// updates or deletes audit rows.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, entry: AuditEntry) -> BookingResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, action, actor_id, actor_role, target, meta, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(&entry.action)
        .bind(&entry.actor_id)
        .bind(&entry.actor_role)
        .bind(entry.target)
        .bind(&entry.meta)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}
