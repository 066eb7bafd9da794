use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dtos::double_option;
use crate::models::enums::{ProductType, StorageLocation};
use crate::models::product::Product;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    // user_id comes from auth context
    pub name: String,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub unit: Option<String>,
    pub product_type: ProductType,
    pub barcode: Option<String>,
    pub default_storage_location: Option<StorageLocation>,
    pub shelf_life_days: Option<i32>,
}

/// PATCH payload: absent fields keep their stored values, explicit nulls
/// reset nullable columns.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub brand: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit: Option<Option<String>>,
    pub product_type: Option<ProductType>,
    #[serde(default, deserialize_with = "double_option")]
    pub barcode: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_storage_location: Option<Option<StorageLocation>>,
    #[serde(default, deserialize_with = "double_option")]
    pub shelf_life_days: Option<Option<i32>>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub unit: Option<String>,
    pub product_type: ProductType,
    pub barcode: Option<String>,
    pub default_storage_location: Option<StorageLocation>,
    pub shelf_life_days: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            user_id: product.user_id,
            name: product.name,
            brand: product.brand,
            size: product.size,
            unit: product.unit,
            product_type: product.product_type,
            barcode: product.barcode,
            default_storage_location: product.default_storage_location,
            shelf_life_days: product.shelf_life_days,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
