use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::auth::id_token::IdTokenClaims;
use crate::dtos::user::UserResponse;
use crate::error::{map_unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::user::User;
use crate::state::AppState;

const USER_COLUMNS: &str = "id, identity_uid, email, display_name, created_at, updated_at";

// POST /users - register the caller from their verified ID-token claims.
// Get-or-create keyed on the IdP subject: a concurrent duplicate insert is
// recovered by re-reading the existing row.
pub async fn register_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(claims): Extension<IdTokenClaims>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let email = claims
        .email
        .clone()
        .ok_or_else(|| AppError::validation("ID token has no email claim"))?;

    let inserted = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (identity_uid, email, display_name)
         VALUES ($1, $2, $3)
         ON CONFLICT (identity_uid) DO NOTHING
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&claims.sub)
    .bind(&email)
    .bind(&claims.name)
    .fetch_optional(&db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "A user with this email already exists"))?;

    if let Some(user) = inserted {
        return Ok((StatusCode::CREATED, Json(user.into())));
    }

    // lost the insert race (or the user re-registered): return the row the
    // winning request created
    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE identity_uid = $1"
    ))
    .bind(&claims.sub)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::internal("User insert conflicted but no row exists"))?;

    Ok((StatusCode::OK, Json(existing.into())))
}

// GET /users/me
pub async fn get_me(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(user.into()))
}
