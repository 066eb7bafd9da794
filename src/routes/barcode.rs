use axum::{routing::get, Router};

use crate::handlers::barcode::lookup_barcode;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/barcode/{upc}", get(lookup_barcode))
}
