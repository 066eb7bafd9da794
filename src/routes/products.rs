use axum::{routing::get, Router};

use crate::handlers::product::{
    create_product, delete_product, get_product, get_product_by_barcode, list_products,
    update_product,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/by-barcode/{barcode}", get(get_product_by_barcode))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}
