use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::AUTHORIZATION;

use crate::auth::id_token::{verify_id_token, IdTokenClaims};
use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// The caller's resolved local identity, attached as a request extension by
/// `require_user`.
#[derive(Clone)]
pub struct AuthContext {
    pub user_id: i64,
}

fn claims_from_request(req: &Request) -> Result<IdTokenClaims, Response> {
    let auth_header = match req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return Err(AppError::unauthorized("Missing Authorization header").into_response()),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return Err(AppError::unauthorized("Invalid Authorization format").into_response()),
    };

    let secret = match std::env::var("ID_TOKEN_SECRET") {
        Ok(s) => s,
        Err(_) => return Err(AppError::unauthorized("Server auth misconfiguration").into_response()),
    };

    verify_id_token(token, &secret).map_err(|e| e.into_response())
}

/// Requires only a valid ID token. Used by registration, which runs before a
/// local user row exists.
pub async fn require_claims(mut req: Request, next: Next) -> Response {
    let claims = match claims_from_request(&req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Requires a valid ID token AND a local user record for its subject.
/// Handlers downstream see only the resolved `AuthContext`.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = match claims_from_request(&req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let user = sqlx::query_as::<_, User>(
        "SELECT id, identity_uid, email, display_name, created_at, updated_at
         FROM users WHERE identity_uid = $1",
    )
    .bind(&claims.sub)
    .fetch_optional(&state.db_pool)
    .await;

    match user {
        Ok(Some(user)) => {
            req.extensions_mut().insert(AuthContext { user_id: user.id });
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Ok(None) => AppError::not_found("User not found").into_response(),
        Err(e) => AppError::db(e).into_response(),
    }
}
