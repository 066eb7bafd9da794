use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dtos::double_option;
use crate::models::enums::StorageLocation;
use crate::models::inventory_batch::InventoryBatch;

#[derive(Debug, Deserialize)]
pub struct CreateInventoryBatchRequest {
    pub grocery_run_id: i64,
    pub product_id: i64,
    pub quantity_added: Decimal,
    // a batch may start with some quantity already accounted for,
    // e.g. created directly in the "fully used" state
    pub quantity_used: Option<Decimal>,
    pub quantity_spoiled: Option<Decimal>,
    pub quantity_disposed: Option<Decimal>,
    /// Falls back to the product's default when unset.
    pub storage_location: Option<StorageLocation>,
    pub expired_at: Option<DateTime<Utc>>,
}

/// PATCH payload. Quantities and references are non-nullable columns, so a
/// plain `Option` is enough; `storage_location`/`expired_at` can be
/// explicitly reset to null and need the omitted-vs-null distinction.
/// `completed_at` is never patchable: it is re-derived on every write.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInventoryBatchRequest {
    pub grocery_run_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity_added: Option<Decimal>,
    pub quantity_used: Option<Decimal>,
    pub quantity_spoiled: Option<Decimal>,
    pub quantity_disposed: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub storage_location: Option<Option<StorageLocation>>,
    #[serde(default, deserialize_with = "double_option")]
    pub expired_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Serialize)]
pub struct InventoryBatchResponse {
    pub id: i64,
    pub grocery_run_id: i64,
    pub product_id: i64,

    pub quantity_added: Decimal,
    pub quantity_used: Decimal,
    pub quantity_spoiled: Decimal,
    pub quantity_disposed: Decimal,
    pub quantity_current: Decimal,

    pub storage_location: Option<StorageLocation>,

    pub added_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<InventoryBatch> for InventoryBatchResponse {
    fn from(batch: InventoryBatch) -> Self {
        Self {
            id: batch.id,
            grocery_run_id: batch.grocery_run_id,
            product_id: batch.product_id,
            quantity_added: batch.quantity_added,
            quantity_used: batch.quantity_used,
            quantity_spoiled: batch.quantity_spoiled,
            quantity_disposed: batch.quantity_disposed,
            quantity_current: batch.quantity_current,
            storage_location: batch.storage_location,
            added_at: batch.added_at,
            expired_at: batch.expired_at,
            updated_at: batch.updated_at,
            completed_at: batch.completed_at,
        }
    }
}
