use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use pitchside_core::repository::{Turf, TurfCatalog};
use pitchside_core::BookingResult;

use crate::store_err;

pub struct PgTurfCatalog {
    pool: PgPool,
}

impl PgTurfCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TurfRow {
    id: Uuid,
    name: String,
    price_per_hour: i64,
    is_approved: bool,
}

#[async_trait]
impl TurfCatalog for PgTurfCatalog {
    async fn get_turf(&self, turf_id: Uuid) -> BookingResult<Option<Turf>> {
        let row: Option<TurfRow> = sqlx::query_as(
            "SELECT id, name, price_per_hour, is_approved FROM turfs WHERE id = $1",
        )
        .bind(turf_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|row| Turf {
            id: row.id,
            name: row.name,
            price_per_hour: row.price_per_hour,
            is_approved: row.is_approved,
        }))
    }
}
