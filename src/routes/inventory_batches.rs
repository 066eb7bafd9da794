use axum::{routing::get, Router};

use crate::handlers::inventory_batch::{
    create_inventory_batch, delete_inventory_batch, get_inventory_batch,
    list_inventory_batches, update_inventory_batch,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inventory-batches",
            get(list_inventory_batches).post(create_inventory_batch),
        )
        .route(
            "/inventory-batches/{id}",
            get(get_inventory_batch)
                .patch(update_inventory_batch)
                .delete(delete_inventory_batch),
        )
}
