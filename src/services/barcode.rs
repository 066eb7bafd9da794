//! Barcode-to-product lookup across three external providers.
//!
//! Providers are tried strictly in priority order (priority = trust order,
//! not an optimization target): FDC, then OpenFoodFacts, then an optional
//! commercial provider. The first hit wins. FDC errors abort the whole
//! lookup; the other two only ever miss softly.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::BarcodeConfig;
use crate::dtos::barcode::{BarcodeLookupResult, BarcodeSource};
use crate::error::AppError;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Advisory only: lengths outside this set are logged and the lookup
/// proceeds regardless.
const KNOWN_UPC_LENGTHS: [usize; 4] = [8, 12, 13, 14];

/// Outcome of one provider call. The chain decides what `Failed` means:
/// fatal for FDC, a soft miss everywhere else.
#[derive(Debug)]
pub enum ProviderOutcome {
    Hit(Box<BarcodeLookupResult>),
    Miss,
    Failed { status: u16, body: String },
}

/// Shared provider client: one per process, constructed in `main` with its
/// configuration captured, cloned cheaply into each request task.
#[derive(Clone)]
pub struct BarcodeClient {
    http: Client,
    cfg: BarcodeConfig,
}

impl BarcodeClient {
    pub fn new(cfg: BarcodeConfig) -> Self {
        let http = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("reqwest client options are static");
        Self { http, cfg }
    }

    /// Runs the full chain for one barcode. Returns the normalized result,
    /// found or not; only input validation, configuration faults, and FDC
    /// errors surface as `Err`.
    pub async fn lookup(&self, upc: &str) -> Result<BarcodeLookupResult, AppError> {
        let upc = upc.trim();

        if upc.is_empty() || !upc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::validation("UPC must be digits only"));
        }
        if !KNOWN_UPC_LENGTHS.contains(&upc.len()) {
            warn!(upc, len = upc.len(), "UPC length outside known formats, looking up anyway");
        }

        match self.fetch_from_fdc(upc).await? {
            ProviderOutcome::Hit(hit) => return Ok(*hit),
            ProviderOutcome::Failed { status, body } => {
                return Err(AppError::gateway("fdc", Some(status), body));
            }
            ProviderOutcome::Miss => {}
        }

        if let ProviderOutcome::Hit(hit) = self.fetch_from_openfoodfacts(upc).await {
            return Ok(*hit);
        }

        if let ProviderOutcome::Hit(hit) = self.fetch_from_commercial(upc).await {
            return Ok(*hit);
        }

        Ok(BarcodeLookupResult::not_found(upc))
    }

    /// FDC branded-food search. The key is required: its absence is a
    /// configuration fault, not a skip. Any non-success status (and any
    /// transport failure, timeouts included) is fatal to the whole request;
    /// only an empty result set falls through.
    async fn fetch_from_fdc(&self, upc: &str) -> Result<ProviderOutcome, AppError> {
        let api_key = self
            .cfg
            .fdc_api_key
            .as_deref()
            .ok_or_else(|| AppError::config("FDC_API_KEY is not set"))?;

        let url = format!("{}/foods/search", self.cfg.fdc_base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("query", upc),
                ("dataType", "Branded"),
                ("pageSize", "5"),
            ])
            .send()
            .await
            .map_err(|e| AppError::gateway("fdc", None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(ProviderOutcome::Failed { status: status.as_u16(), body });
        }

        let data: FdcSearchResponse = resp
            .json()
            .await
            .map_err(|e| AppError::gateway("fdc", None, e.to_string()))?;

        Ok(normalize_fdc(upc, data))
    }

    /// OpenFoodFacts direct product lookup. Everything that is not a clean
    /// hit (transport error, non-success status, "not found" flag in the
    /// body) is a soft miss and the chain continues.
    async fn fetch_from_openfoodfacts(&self, upc: &str) -> ProviderOutcome {
        let url = format!("{}/api/v2/product/{}.json", self.cfg.off_base_url, upc);
        let resp = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "OpenFoodFacts unreachable, skipping");
                return ProviderOutcome::Miss;
            }
        };
        if !resp.status().is_success() {
            return ProviderOutcome::Miss;
        }
        let data: OffResponse = match resp.json().await {
            Ok(d) => d,
            Err(_) => return ProviderOutcome::Miss,
        };

        normalize_off(upc, data)
    }

    /// Optional commercial lookup: skipped entirely when no key is
    /// configured. Soft miss on any problem, including a success response
    /// without a product name.
    async fn fetch_from_commercial(&self, upc: &str) -> ProviderOutcome {
        let Some(api_key) = self.cfg.commercial_api_key.as_deref() else {
            return ProviderOutcome::Miss;
        };

        let url = format!("{}/lookup", self.cfg.commercial_base_url);
        let resp = match self
            .http
            .get(&url)
            .query(&[("upc", upc)])
            .bearer_auth(api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Commercial provider unreachable, skipping");
                return ProviderOutcome::Miss;
            }
        };
        if !resp.status().is_success() {
            return ProviderOutcome::Miss;
        }
        let data: Value = match resp.json().await {
            Ok(d) => d,
            Err(_) => return ProviderOutcome::Miss,
        };

        normalize_commercial(upc, data)
    }
}

// ==================== FDC ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcSearchResponse {
    #[serde(default)]
    foods: Option<Vec<FdcFood>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcFood {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    brand_owner: Option<String>,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    fdc_id: Option<i64>,
    #[serde(default)]
    gtin_upc: Option<String>,
    #[serde(default)]
    food_nutrients: Option<Vec<FdcNutrient>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcNutrient {
    #[serde(default)]
    nutrient_name: Option<String>,
    #[serde(default)]
    value: Option<f64>,
}

fn normalize_fdc(upc: &str, data: FdcSearchResponse) -> ProviderOutcome {
    let foods = data.foods.unwrap_or_default();
    let Some(top) = foods.into_iter().next() else {
        return ProviderOutcome::Miss;
    };

    // first "energy" entry with a value, among the leading nutrients
    let mut nutrition = None;
    for n in top.food_nutrients.as_deref().unwrap_or(&[]).iter().take(50) {
        let name = n.nutrient_name.as_deref().unwrap_or("");
        if name.eq_ignore_ascii_case("energy") {
            if let Some(v) = n.value {
                let mut map = BTreeMap::new();
                map.insert("calories".to_string(), v);
                nutrition = Some(map);
                break;
            }
        }
    }

    ProviderOutcome::Hit(Box::new(BarcodeLookupResult {
        upc: upc.to_string(),
        found: true,
        source: Some(BarcodeSource::Fdc),
        name: non_blank(top.description.clone()),
        brand: non_blank(top.brand_owner.clone()).or_else(|| non_blank(top.brand_name.clone())),
        image: None,
        nutrition,
        raw: Some(json!({ "fdcId": top.fdc_id, "gtinUpc": top.gtin_upc })),
    }))
}

// ==================== OpenFoodFacts ====================

#[derive(Debug, Default, Deserialize)]
struct OffResponse {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    product: Option<OffProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct OffProduct {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    generic_name: Option<String>,
    #[serde(default)]
    product_name_en: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    nutriments: Option<OffNutriments>,
    #[serde(default, rename = "_id")]
    id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct OffNutriments {
    #[serde(default, rename = "energy-kcal_100g")]
    energy_kcal_100g: Option<f64>,
    #[serde(default)]
    proteins_100g: Option<f64>,
    #[serde(default)]
    carbohydrates_100g: Option<f64>,
    #[serde(default)]
    fat_100g: Option<f64>,
}

fn normalize_off(upc: &str, data: OffResponse) -> ProviderOutcome {
    if data.status != Some(1) {
        return ProviderOutcome::Miss;
    }
    let p = data.product.unwrap_or_default();
    let nutr = p.nutriments.unwrap_or_default();

    // fixed per-100g subset; only values the provider actually sent
    let mut nutrition = BTreeMap::new();
    if let Some(v) = nutr.energy_kcal_100g {
        nutrition.insert("calories".to_string(), v);
    }
    if let Some(v) = nutr.proteins_100g {
        nutrition.insert("protein_g".to_string(), v);
    }
    if let Some(v) = nutr.carbohydrates_100g {
        nutrition.insert("carbs_g".to_string(), v);
    }
    if let Some(v) = nutr.fat_100g {
        nutrition.insert("fat_g".to_string(), v);
    }

    ProviderOutcome::Hit(Box::new(BarcodeLookupResult {
        upc: upc.to_string(),
        found: true,
        source: Some(BarcodeSource::Off),
        name: non_blank(p.product_name)
            .or_else(|| non_blank(p.generic_name))
            .or_else(|| non_blank(p.product_name_en)),
        brand: non_blank(p.brands),
        image: non_blank(p.image_url),
        nutrition: if nutrition.is_empty() { None } else { Some(nutrition) },
        raw: Some(json!({ "off_id": p.id })),
    }))
}

// ==================== Commercial ====================

fn normalize_commercial(upc: &str, data: Value) -> ProviderOutcome {
    let Some(name) = non_blank(data.get("name").and_then(Value::as_str).map(str::to_string))
    else {
        return ProviderOutcome::Miss;
    };

    let nutrition = data
        .get("nutrition")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect::<BTreeMap<_, _>>()
        })
        .filter(|m| !m.is_empty());

    ProviderOutcome::Hit(Box::new(BarcodeLookupResult {
        upc: upc.to_string(),
        found: true,
        source: Some(BarcodeSource::Commercial),
        name: Some(name),
        brand: data.get("brand").and_then(Value::as_str).map(str::to_string),
        image: data.get("image").and_then(Value::as_str).map(str::to_string),
        nutrition,
        raw: Some(json!({ "provider": "commercial" })),
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
