//! Provider-chain behavior against mock provider servers bound to ephemeral
//! ports. Call counters prove which providers were contacted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use pantrylog_backend::config::BarcodeConfig;
use pantrylog_backend::dtos::barcode::BarcodeSource;
use pantrylog_backend::error::AppError;
use pantrylog_backend::services::barcode::BarcodeClient;

#[derive(Clone, Copy)]
enum FdcMode {
    Hit,
    Empty,
    Error,
}

#[derive(Clone, Copy)]
enum OffMode {
    Hit,
    NotFoundFlag,
    Http404,
}

#[derive(Clone, Copy)]
enum CommercialMode {
    Hit,
    Nameless,
}

#[derive(Clone)]
struct MockState {
    fdc_mode: FdcMode,
    off_mode: OffMode,
    commercial_mode: CommercialMode,
    fdc_calls: Arc<AtomicUsize>,
    off_calls: Arc<AtomicUsize>,
    commercial_calls: Arc<AtomicUsize>,
}

async fn fdc_search(State(s): State<MockState>) -> Response {
    s.fdc_calls.fetch_add(1, Ordering::SeqCst);
    match s.fdc_mode {
        FdcMode::Hit => Json(json!({
            "foods": [{
                "description": "Granola Bar",
                "brandOwner": "Acme Foods",
                "fdcId": 555,
                "gtinUpc": "012345678905",
                "foodNutrients": [
                    { "nutrientName": "Protein", "value": 9.0 },
                    { "nutrientName": "Energy", "value": 410.0 }
                ]
            }]
        }))
        .into_response(),
        FdcMode::Empty => Json(json!({ "foods": [] })).into_response(),
        FdcMode::Error => (StatusCode::INTERNAL_SERVER_ERROR, "fdc exploded").into_response(),
    }
}

async fn off_product(State(s): State<MockState>, Path(_upc): Path<String>) -> Response {
    s.off_calls.fetch_add(1, Ordering::SeqCst);
    match s.off_mode {
        OffMode::Hit => Json(json!({
            "status": 1,
            "product": {
                "_id": "4006381333931",
                "product_name": "Dark Chocolate",
                "brands": "Choco Co",
                "image_url": "https://images.example/choc.jpg",
                "nutriments": {
                    "energy-kcal_100g": 546.0,
                    "proteins_100g": 7.9,
                    "carbohydrates_100g": 46.0,
                    "fat_100g": 31.0
                }
            }
        }))
        .into_response(),
        OffMode::NotFoundFlag => {
            Json(json!({ "status": 0, "status_verbose": "product not found" })).into_response()
        }
        OffMode::Http404 => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn commercial_lookup(State(s): State<MockState>) -> Response {
    s.commercial_calls.fetch_add(1, Ordering::SeqCst);
    match s.commercial_mode {
        CommercialMode::Hit => Json(json!({
            "name": "Cola 330ml",
            "brand": "Acme",
            "image": "https://images.example/cola.jpg",
            "nutrition": { "calories": 139.0 }
        }))
        .into_response(),
        CommercialMode::Nameless => Json(json!({ "brand": "Acme" })).into_response(),
    }
}

struct MockProviders {
    base_url: String,
    state: MockState,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockProviders {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn_providers(fdc: FdcMode, off: OffMode, commercial: CommercialMode) -> MockProviders {
    let state = MockState {
        fdc_mode: fdc,
        off_mode: off,
        commercial_mode: commercial,
        fdc_calls: Arc::new(AtomicUsize::new(0)),
        off_calls: Arc::new(AtomicUsize::new(0)),
        commercial_calls: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/fdc/foods/search", get(fdc_search))
        .route("/off/api/v2/product/{upc}", get(off_product))
        .route("/comm/lookup", get(commercial_lookup))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockProviders {
        base_url: format!("http://{addr}"),
        state,
        handle,
    }
}

fn chain_client(
    providers: &MockProviders,
    fdc_key: Option<&str>,
    commercial_key: Option<&str>,
) -> BarcodeClient {
    BarcodeClient::new(BarcodeConfig {
        fdc_base_url: format!("{}/fdc", providers.base_url),
        off_base_url: format!("{}/off", providers.base_url),
        commercial_base_url: format!("{}/comm", providers.base_url),
        fdc_api_key: fdc_key.map(String::from),
        commercial_api_key: commercial_key.map(String::from),
    })
}

#[tokio::test]
async fn fdc_hit_short_circuits_the_chain() {
    let providers = spawn_providers(FdcMode::Hit, OffMode::Hit, CommercialMode::Hit).await;
    let client = chain_client(&providers, Some("k"), Some("k"));

    let result = client.lookup("012345678905").await.unwrap();

    assert!(result.found);
    assert_eq!(result.source, Some(BarcodeSource::Fdc));
    assert_eq!(result.name.as_deref(), Some("Granola Bar"));
    assert_eq!(result.brand.as_deref(), Some("Acme Foods"));
    assert_eq!(result.image, None);
    assert_eq!(result.nutrition.unwrap().get("calories"), Some(&410.0));

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 1);
    // lower-priority providers must never be contacted after a hit
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 0);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fdc_empty_result_falls_back_to_off() {
    let providers = spawn_providers(FdcMode::Empty, OffMode::Hit, CommercialMode::Hit).await;
    let client = chain_client(&providers, Some("k"), Some("k"));

    let result = client.lookup("4006381333931").await.unwrap();

    assert!(result.found);
    assert_eq!(result.source, Some(BarcodeSource::Off));
    assert_eq!(result.name.as_deref(), Some("Dark Chocolate"));
    assert_eq!(result.brand.as_deref(), Some("Choco Co"));
    assert_eq!(result.image.as_deref(), Some("https://images.example/choc.jpg"));
    let nutrition = result.nutrition.unwrap();
    assert_eq!(nutrition.get("calories"), Some(&546.0));
    assert_eq!(nutrition.get("protein_g"), Some(&7.9));
    assert_eq!(nutrition.get("carbs_g"), Some(&46.0));
    assert_eq!(nutrition.get("fat_g"), Some(&31.0));

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 1);
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 1);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn commercial_is_the_last_resort() {
    let providers = spawn_providers(FdcMode::Empty, OffMode::Http404, CommercialMode::Hit).await;
    let client = chain_client(&providers, Some("k"), Some("comm-key"));

    let result = client.lookup("5449000000996").await.unwrap();

    assert!(result.found);
    assert_eq!(result.source, Some(BarcodeSource::Commercial));
    assert_eq!(result.name.as_deref(), Some("Cola 330ml"));
    assert_eq!(result.nutrition.unwrap().get("calories"), Some(&139.0));

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 1);
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 1);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_chain_returns_the_not_found_sentinel() {
    // commercial has no key configured, so it is skipped without a call
    let providers =
        spawn_providers(FdcMode::Empty, OffMode::NotFoundFlag, CommercialMode::Hit).await;
    let client = chain_client(&providers, Some("k"), None);

    let result = client.lookup("00000000").await.unwrap();

    assert!(!result.found);
    assert_eq!(result.upc, "00000000");
    assert_eq!(result.source, None);
    assert_eq!(result.name, None);
    assert_eq!(result.brand, None);
    assert_eq!(result.image, None);
    assert!(result.nutrition.is_none());
    assert!(result.raw.is_none());

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 1);
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 1);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn commercial_response_without_a_name_is_a_miss() {
    let providers =
        spawn_providers(FdcMode::Empty, OffMode::NotFoundFlag, CommercialMode::Nameless).await;
    let client = chain_client(&providers, Some("k"), Some("comm-key"));

    let result = client.lookup("5449000000996").await.unwrap();

    assert!(!result.found);
    assert_eq!(result.source, None);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fdc_http_error_aborts_the_chain() {
    let providers = spawn_providers(FdcMode::Error, OffMode::Hit, CommercialMode::Hit).await;
    let client = chain_client(&providers, Some("k"), Some("k"));

    let err = client.lookup("012345678905").await.unwrap_err();

    match err {
        AppError::Gateway { provider, status, body } => {
            assert_eq!(provider, "fdc");
            assert_eq!(status, Some(500));
            assert_eq!(body, "fdc exploded");
        }
        other => panic!("expected a gateway error, got {other:?}"),
    }

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 1);
    // an FDC fault must not fall through to the other providers
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 0);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_fdc_key_fails_before_any_provider_call() {
    let providers = spawn_providers(FdcMode::Hit, OffMode::Hit, CommercialMode::Hit).await;
    let client = chain_client(&providers, None, Some("k"));

    let err = client.lookup("012345678905").await.unwrap_err();
    assert!(matches!(err, AppError::Config(_)));

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 0);
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 0);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_digit_upc_is_rejected_before_provider_contact() {
    let providers = spawn_providers(FdcMode::Hit, OffMode::Hit, CommercialMode::Hit).await;
    let client = chain_client(&providers, Some("k"), Some("k"));

    let err = client.lookup("12a45").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(providers.state.fdc_calls.load(Ordering::SeqCst), 0);
    assert_eq!(providers.state.off_calls.load(Ordering::SeqCst), 0);
    assert_eq!(providers.state.commercial_calls.load(Ordering::SeqCst), 0);
}
