use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_type", rename_all = "lowercase")]
pub enum ProductType {
    Vegetable,
    Fruit,
    Packaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "storage_location", rename_all = "lowercase")]
pub enum StorageLocation {
    Fridge,
    Pantry,
    Freezer,
}
