use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use sqlx::PgPool;

use crate::dtos::grocery_run::{
    CreateGroceryRunRequest, GroceryRunResponse, UpdateGroceryRunRequest,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::grocery_run::GroceryRun;
use crate::state::AppState;

const RUN_COLUMNS: &str =
    "id, user_id, trip_date, store_name, total_cost, notes, archived, created_at, updated_at";

async fn load_run(
    pool: &PgPool,
    user_id: i64,
    run_id: i64,
) -> Result<Option<GroceryRun>, AppError> {
    let run = sqlx::query_as::<_, GroceryRun>(&format!(
        "SELECT {RUN_COLUMNS} FROM grocery_runs WHERE id = $1 AND user_id = $2"
    ))
    .bind(run_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(run)
}

#[derive(Debug, Deserialize)]
pub struct GroceryRunListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub archived: Option<bool>,
}

// GET /grocery-runs - list the caller's runs, most recent trip first
pub async fn list_grocery_runs(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<GroceryRunListParams>,
) -> Result<Json<Vec<GroceryRunResponse>>, AppError> {
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 200);

    let runs = sqlx::query_as::<_, GroceryRun>(&format!(
        "SELECT {RUN_COLUMNS} FROM grocery_runs
         WHERE user_id = $1
           AND ($2::BOOLEAN IS NULL OR archived = $2)
         ORDER BY trip_date DESC
         OFFSET $3 LIMIT $4"
    ))
    .bind(auth.user_id)
    .bind(params.archived)
    .bind(offset)
    .bind(limit)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(runs.into_iter().map(Into::into).collect()))
}

// GET /grocery-runs/:id
pub async fn get_grocery_run(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<GroceryRunResponse>, AppError> {
    let run = load_run(&db_pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Grocery run {id} not found")))?;

    Ok(Json(run.into()))
}

// POST /grocery-runs
pub async fn create_grocery_run(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateGroceryRunRequest>,
) -> Result<(StatusCode, Json<GroceryRunResponse>), AppError> {
    let run = sqlx::query_as::<_, GroceryRun>(&format!(
        "INSERT INTO grocery_runs (user_id, trip_date, store_name, total_cost, notes, archived)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(auth.user_id)
    .bind(req.trip_date)
    .bind(&req.store_name)
    .bind(req.total_cost)
    .bind(&req.notes)
    .bind(req.archived)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(run.into())))
}

// PATCH /grocery-runs/:id
pub async fn update_grocery_run(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateGroceryRunRequest>,
) -> Result<Json<GroceryRunResponse>, AppError> {
    let run = load_run(&db_pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Grocery run {id} not found")))?;

    let trip_date = patch.trip_date.unwrap_or(run.trip_date);
    let store_name = patch.store_name.unwrap_or(run.store_name);
    let total_cost = patch.total_cost.unwrap_or(run.total_cost);
    let notes = patch.notes.unwrap_or(run.notes);
    let archived = patch.archived.unwrap_or(run.archived);

    let updated = sqlx::query_as::<_, GroceryRun>(&format!(
        "UPDATE grocery_runs SET
            trip_date = $1, store_name = $2, total_cost = $3, notes = $4, archived = $5,
            updated_at = now()
         WHERE id = $6 AND user_id = $7
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(trip_date)
    .bind(&store_name)
    .bind(total_cost)
    .bind(&notes)
    .bind(archived)
    .bind(id)
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(updated.into()))
}

// DELETE /grocery-runs/:id - 204 whether or not a row existed; the store
// cascades to the run's batches
pub async fn delete_grocery_run(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    sqlx::query("DELETE FROM grocery_runs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
