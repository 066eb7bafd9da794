use axum::extract::{Path, State};
use axum::{Extension, Json};
use tracing::instrument;

use crate::dtos::barcode::BarcodeLookupResult;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

// GET /barcode/:upc - resolve a barcode through the provider chain.
// 200 with the normalized result whether or not anything was found; 400 for
// a non-digit upc, 502/500 only for FDC or configuration faults.
#[instrument(skip_all)]
pub async fn lookup_barcode(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(upc): Path<String>,
) -> Result<Json<BarcodeLookupResult>, AppError> {
    let result = state.barcode.lookup(&upc).await?;
    Ok(Json(result))
}
