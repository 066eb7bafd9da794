use chrono::{DateTime, Utc};

use crate::models::enums::{ProductType, StorageLocation};

#[derive(Debug, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub unit: Option<String>,
    pub product_type: ProductType,
    pub barcode: Option<String>,
    // optional default lives here, the actual location on the batch
    pub default_storage_location: Option<StorageLocation>,
    pub shelf_life_days: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
