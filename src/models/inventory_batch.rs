use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::enums::StorageLocation;

#[derive(Debug, sqlx::FromRow)]
pub struct InventoryBatch {
    pub id: i64,
    pub grocery_run_id: i64,
    pub product_id: i64,

    // quantities are counts/weights of a product
    pub quantity_added: Decimal,
    pub quantity_used: Decimal,
    pub quantity_spoiled: Decimal,
    pub quantity_disposed: Decimal,
    /// Generated column, never written by the application.
    pub quantity_current: Decimal,

    pub storage_location: Option<StorageLocation>,

    pub added_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Non-null iff the batch balance is exactly zero as of the last write.
    pub completed_at: Option<DateTime<Utc>>,
}
