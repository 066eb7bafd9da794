use axum::{routing::get, Router};

use crate::handlers::grocery_run::{
    create_grocery_run, delete_grocery_run, get_grocery_run, list_grocery_runs,
    update_grocery_run,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/grocery-runs", get(list_grocery_runs).post(create_grocery_run))
        .route(
            "/grocery-runs/{id}",
            get(get_grocery_run)
                .patch(update_grocery_run)
                .delete(delete_grocery_run),
        )
}
