pub mod barcode;
pub mod grocery_runs;
pub mod inventory_batches;
pub mod products;
pub mod users;

use axum::middleware;
use axum::Router;

use crate::middleware::auth::{require_claims, require_user};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    // registration only needs verified claims: the local user row does not
    // exist yet when it runs
    let registration = Router::new()
        .merge(users::registration_routes())
        .route_layer(middleware::from_fn(require_claims));

    // everything else requires the resolved local user
    let protected = Router::new()
        .merge(users::routes())
        .merge(products::routes())
        .merge(grocery_runs::routes())
        .merge(inventory_batches::routes())
        .merge(barcode::routes())
        .route_layer(middleware::from_fn_with_state(state, require_user));

    Router::new().merge(registration).merge(protected)
}
