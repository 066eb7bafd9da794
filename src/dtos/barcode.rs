use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeSource {
    Fdc,
    Off,
    Commercial,
}

/// Normalized lookup result. Every provider branch returns this same shape;
/// `nutrition` is `None` when no nutrient data was extracted (never an empty
/// map), so "no data" stays distinguishable from "zero calories".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodeLookupResult {
    pub upc: String,
    pub found: bool,
    pub source: Option<BarcodeSource>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub nutrition: Option<BTreeMap<String, f64>>,
    /// Opaque provider-specific payload, retained for debugging.
    pub raw: Option<serde_json::Value>,
}

impl BarcodeLookupResult {
    pub fn not_found(upc: impl Into<String>) -> Self {
        Self {
            upc: upc.into(),
            found: false,
            source: None,
            name: None,
            brand: None,
            image: None,
            nutrition: None,
            raw: None,
        }
    }
}
