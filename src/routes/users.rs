use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::user::{get_me, register_user};
use crate::state::AppState;

pub fn registration_routes() -> Router<AppState> {
    Router::new().route("/users", post(register_user))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}
