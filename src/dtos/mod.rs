pub mod barcode;
pub mod grocery_run;
pub mod inventory_batch;
pub mod product;
pub mod user;

use serde::{Deserialize, Deserializer};

/// For nullable columns in PATCH bodies: distinguishes "field omitted"
/// (outer `None`, keep the stored value) from `"field": null` (inner `None`,
/// reset the column). Pair with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
