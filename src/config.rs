// src/config.rs
use std::env;

use tracing::info;

/// Barcode-provider configuration, read from the environment once at startup
/// and injected into the provider client. The FDC key is required for
/// lookups (its absence is a server fault at call time); the commercial key
/// is optional and merely disables that provider.
#[derive(Clone, Debug)]
pub struct BarcodeConfig {
    pub fdc_base_url: String,
    pub off_base_url: String,
    pub commercial_base_url: String,
    pub fdc_api_key: Option<String>,
    pub commercial_api_key: Option<String>,
}

impl BarcodeConfig {
    pub fn from_env() -> Self {
        Self {
            fdc_base_url: var_or("FDC_BASE_URL", "https://api.nal.usda.gov/fdc/v1"),
            off_base_url: var_or("OFF_BASE_URL", "https://world.openfoodfacts.org"),
            commercial_base_url: var_or("COMM_UPC_BASE_URL", "https://example-upc-provider.com"),
            fdc_api_key: non_blank(env::var("FDC_API_KEY").ok()),
            commercial_api_key: non_blank(env::var("COMM_UPC_API_KEY").ok()),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

/// Treats unset and whitespace-only values the same.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_drops_empty_and_whitespace() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("".into())), None);
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" key ".into())), Some("key".to_string()));
    }
}
