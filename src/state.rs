// src/state.rs
use sqlx::PgPool;

use crate::services::barcode::BarcodeClient;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub barcode: BarcodeClient,
}

impl AppState {
    pub fn new(db_pool: PgPool, barcode: BarcodeClient) -> Self {
        Self { db_pool, barcode }
    }
}
