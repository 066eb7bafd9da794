use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::dtos::inventory_batch::{
    CreateInventoryBatchRequest, InventoryBatchResponse, UpdateInventoryBatchRequest,
};
use crate::error::{AppError, QuantityValidationError};
use crate::middleware::auth::AuthContext;
use crate::models::enums::StorageLocation;
use crate::models::inventory_batch::InventoryBatch;
use crate::models::product::Product;
use crate::state::AppState;

/// Validates a batch's effective quantities and derives its completion
/// marker. Absent optional quantities count as zero. Returns the value to
/// store in `completed_at`: `Some(now)` when the balance
/// `added - used - spoiled - disposed` is exactly zero, `None` otherwise.
///
/// Pure; invoked identically from the create and update paths.
pub fn validate_quantities(
    quantity_added: Decimal,
    quantity_used: Option<Decimal>,
    quantity_spoiled: Option<Decimal>,
    quantity_disposed: Option<Decimal>,
) -> Result<Option<DateTime<Utc>>, QuantityValidationError> {
    let used = quantity_used.unwrap_or(Decimal::ZERO);
    let spoiled = quantity_spoiled.unwrap_or(Decimal::ZERO);
    let disposed = quantity_disposed.unwrap_or(Decimal::ZERO);

    if quantity_added < Decimal::ZERO
        || used < Decimal::ZERO
        || spoiled < Decimal::ZERO
        || disposed < Decimal::ZERO
    {
        return Err(QuantityValidationError::new("Quantities must be >= 0"));
    }

    if used + spoiled + disposed > quantity_added {
        return Err(QuantityValidationError::new(
            "quantity_used + quantity_spoiled + quantity_disposed must be <= quantity_added",
        ));
    }

    if quantity_added - used - spoiled - disposed == Decimal::ZERO {
        Ok(Some(Utc::now()))
    } else {
        Ok(None)
    }
}

/// Effective quantities for a patch: each field takes the patch's value when
/// present, the stored value otherwise.
fn effective_quantities(
    batch: &InventoryBatch,
    patch: &UpdateInventoryBatchRequest,
) -> (Decimal, Decimal, Decimal, Decimal) {
    (
        patch.quantity_added.unwrap_or(batch.quantity_added),
        patch.quantity_used.unwrap_or(batch.quantity_used),
        patch.quantity_spoiled.unwrap_or(batch.quantity_spoiled),
        patch.quantity_disposed.unwrap_or(batch.quantity_disposed),
    )
}

const BATCH_COLUMNS: &str = "b.id, b.grocery_run_id, b.product_id, \
    b.quantity_added, b.quantity_used, b.quantity_spoiled, b.quantity_disposed, \
    b.quantity_current, b.storage_location, b.added_at, b.expired_at, b.updated_at, b.completed_at";

/// A batch is owned by a user only through its grocery run's owner, never
/// through its product's owner.
async fn load_owned_batch(
    pool: &PgPool,
    user_id: i64,
    batch_id: i64,
) -> Result<Option<InventoryBatch>, AppError> {
    let batch = sqlx::query_as::<_, InventoryBatch>(&format!(
        "SELECT {BATCH_COLUMNS}
         FROM inventory_batches b
         JOIN grocery_runs r ON r.id = b.grocery_run_id
         WHERE b.id = $1 AND r.user_id = $2"
    ))
    .bind(batch_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(batch)
}

async fn run_owned_by(pool: &PgPool, user_id: i64, run_id: i64) -> Result<bool, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM grocery_runs WHERE id = $1 AND user_id = $2",
    )
    .bind(run_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(id.is_some())
}

async fn load_owned_product(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> Result<Option<Product>, AppError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, user_id, name, brand, size, unit, product_type, barcode,
                default_storage_location, shelf_life_days, created_at, updated_at
         FROM products WHERE id = $1 AND user_id = $2",
    )
    .bind(product_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

#[derive(Debug, Deserialize)]
pub struct BatchListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub storage_location: Option<StorageLocation>,
    pub grocery_run_id: Option<i64>,
}

// GET /inventory-batches - list the caller's batches
pub async fn list_inventory_batches(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<BatchListParams>,
) -> Result<Json<Vec<InventoryBatchResponse>>, AppError> {
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 200);

    let batches = sqlx::query_as::<_, InventoryBatch>(&format!(
        "SELECT {BATCH_COLUMNS}
         FROM inventory_batches b
         JOIN grocery_runs r ON r.id = b.grocery_run_id
         WHERE r.user_id = $1
           AND ($2::storage_location IS NULL OR b.storage_location = $2)
           AND ($3::BIGINT IS NULL OR b.grocery_run_id = $3)
         ORDER BY b.expired_at DESC
         OFFSET $4 LIMIT $5"
    ))
    .bind(auth.user_id)
    .bind(params.storage_location)
    .bind(params.grocery_run_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(batches.into_iter().map(Into::into).collect()))
}

// GET /inventory-batches/:id
pub async fn get_inventory_batch(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<InventoryBatchResponse>, AppError> {
    let batch = load_owned_batch(&db_pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("InventoryBatch {id} not found")))?;

    Ok(Json(batch.into()))
}

// POST /inventory-batches
pub async fn create_inventory_batch(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateInventoryBatchRequest>,
) -> Result<(StatusCode, Json<InventoryBatchResponse>), AppError> {
    // the caller must own both the grocery run and the product referenced by
    // the new batch; a missing or foreign reference reads as 404, not 403,
    // so other users' resources stay invisible
    if !run_owned_by(&db_pool, auth.user_id, req.grocery_run_id).await? {
        return Err(AppError::not_found("Referenced resource not found"));
    }
    let product = load_owned_product(&db_pool, auth.user_id, req.product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Referenced resource not found"))?;

    let completed_at = validate_quantities(
        req.quantity_added,
        req.quantity_used,
        req.quantity_spoiled,
        req.quantity_disposed,
    )?;

    let storage_location = req.storage_location.or(product.default_storage_location);

    let batch = sqlx::query_as::<_, InventoryBatch>(
        "INSERT INTO inventory_batches
            (grocery_run_id, product_id, quantity_added, quantity_used,
             quantity_spoiled, quantity_disposed, storage_location, expired_at, completed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id, grocery_run_id, product_id,
             quantity_added, quantity_used, quantity_spoiled, quantity_disposed,
             quantity_current, storage_location, added_at, expired_at, updated_at, completed_at",
    )
    .bind(req.grocery_run_id)
    .bind(req.product_id)
    .bind(req.quantity_added)
    .bind(req.quantity_used.unwrap_or(Decimal::ZERO))
    .bind(req.quantity_spoiled.unwrap_or(Decimal::ZERO))
    .bind(req.quantity_disposed.unwrap_or(Decimal::ZERO))
    .bind(storage_location)
    .bind(req.expired_at)
    .bind(completed_at)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(batch.into())))
}

// PATCH /inventory-batches/:id - partial update
pub async fn update_inventory_batch(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateInventoryBatchRequest>,
) -> Result<Json<InventoryBatchResponse>, AppError> {
    let batch = load_owned_batch(&db_pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("InventoryBatch {id} not found")))?;

    // re-pointing the batch at another run or product must stay within the
    // caller's resources, same 404 rule as create
    if let Some(run_id) = patch.grocery_run_id {
        if run_id != batch.grocery_run_id && !run_owned_by(&db_pool, auth.user_id, run_id).await? {
            return Err(AppError::not_found("Referenced resource not found"));
        }
    }
    if let Some(product_id) = patch.product_id {
        if product_id != batch.product_id
            && load_owned_product(&db_pool, auth.user_id, product_id).await?.is_none()
        {
            return Err(AppError::not_found("Referenced resource not found"));
        }
    }

    // completion is re-derived from the effective quantities on every
    // update, even when the patch touched no quantity field; on a
    // validation failure nothing is written
    let (added, used, spoiled, disposed) = effective_quantities(&batch, &patch);
    let completed_at = validate_quantities(added, Some(used), Some(spoiled), Some(disposed))?;

    let grocery_run_id = patch.grocery_run_id.unwrap_or(batch.grocery_run_id);
    let product_id = patch.product_id.unwrap_or(batch.product_id);
    let storage_location = match patch.storage_location {
        Some(explicit) => explicit,
        None => batch.storage_location,
    };
    let expired_at = match patch.expired_at {
        Some(explicit) => explicit,
        None => batch.expired_at,
    };

    let updated = sqlx::query_as::<_, InventoryBatch>(
        "UPDATE inventory_batches SET
            grocery_run_id = $1, product_id = $2,
            quantity_added = $3, quantity_used = $4,
            quantity_spoiled = $5, quantity_disposed = $6,
            storage_location = $7, expired_at = $8, completed_at = $9,
            updated_at = now()
         WHERE id = $10
         RETURNING id, grocery_run_id, product_id,
             quantity_added, quantity_used, quantity_spoiled, quantity_disposed,
             quantity_current, storage_location, added_at, expired_at, updated_at, completed_at",
    )
    .bind(grocery_run_id)
    .bind(product_id)
    .bind(added)
    .bind(used)
    .bind(spoiled)
    .bind(disposed)
    .bind(storage_location)
    .bind(expired_at)
    .bind(completed_at)
    .bind(id)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(updated.into()))
}

// DELETE /inventory-batches/:id - 204 whether or not a row existed
pub async fn delete_inventory_batch(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query(
        "DELETE FROM inventory_batches b
         USING grocery_runs r
         WHERE b.id = $1 AND b.grocery_run_id = r.id AND r.user_id = $2",
    )
    .bind(id)
    .bind(auth.user_id)
    .execute(&db_pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(batch_id = id, "delete matched no batch");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn batch(added: &str, used: &str, spoiled: &str, disposed: &str) -> InventoryBatch {
        let now = Utc::now();
        InventoryBatch {
            id: 1,
            grocery_run_id: 10,
            product_id: 20,
            quantity_added: dec(added),
            quantity_used: dec(used),
            quantity_spoiled: dec(spoiled),
            quantity_disposed: dec(disposed),
            quantity_current: dec(added) - dec(used) - dec(spoiled) - dec(disposed),
            storage_location: Some(StorageLocation::Fridge),
            added_at: now,
            expired_at: None,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn negative_quantities_fail() {
        for (a, u, s, d) in [
            ("-1", "0", "0", "0"),
            ("10", "-0.01", "0", "0"),
            ("10", "0", "-1", "0"),
            ("10", "0", "0", "-1"),
        ] {
            let err = validate_quantities(dec(a), Some(dec(u)), Some(dec(s)), Some(dec(d)))
                .unwrap_err();
            assert_eq!(err.to_string(), "Quantities must be >= 0");
        }
    }

    #[test]
    fn sum_exceeding_added_fails() {
        let err = validate_quantities(dec("10"), Some(dec("5")), Some(dec("4")), Some(dec("2")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "quantity_used + quantity_spoiled + quantity_disposed must be <= quantity_added"
        );
    }

    #[test]
    fn absent_optionals_count_as_zero() {
        // added alone, nothing accounted for yet: open
        assert!(validate_quantities(dec("10"), None, None, None).unwrap().is_none());
        // zero added with nothing accounted for balances to zero: complete
        assert!(validate_quantities(dec("0"), None, None, None).unwrap().is_some());
    }

    #[test]
    fn completion_iff_balance_is_exactly_zero() {
        // fully used
        assert!(validate_quantities(dec("10"), Some(dec("10")), None, None).unwrap().is_some());
        // split across the three sinks
        assert!(
            validate_quantities(dec("10"), Some(dec("4")), Some(dec("3.5")), Some(dec("2.5")))
                .unwrap()
                .is_some()
        );
        // anything remaining keeps it open
        assert!(validate_quantities(dec("10"), Some(dec("5")), None, None).unwrap().is_none());
        assert!(
            validate_quantities(dec("10"), Some(dec("9.99")), None, None).unwrap().is_none()
        );
    }

    #[test]
    fn patching_only_used_can_complete_a_batch() {
        // existing (10, 0, 0, 0); the patch mentions only quantity_used
        let existing = batch("10", "0", "0", "0");
        let patch = UpdateInventoryBatchRequest {
            quantity_used: Some(dec("10")),
            ..Default::default()
        };

        let (a, u, s, d) = effective_quantities(&existing, &patch);
        assert_eq!((a, u, s, d), (dec("10"), dec("10"), dec("0"), dec("0")));
        assert!(validate_quantities(a, Some(u), Some(s), Some(d)).unwrap().is_some());
    }

    #[test]
    fn raising_added_reopens_a_complete_batch() {
        let existing = batch("10", "10", "0", "0");
        let patch = UpdateInventoryBatchRequest {
            quantity_added: Some(dec("15")),
            ..Default::default()
        };

        let (a, u, s, d) = effective_quantities(&existing, &patch);
        assert!(validate_quantities(a, Some(u), Some(s), Some(d)).unwrap().is_none());
    }

    #[test]
    fn quantity_free_patch_still_rederives_completion() {
        // storage-only patch against an exhausted batch: the effective
        // quantities are unchanged and completion must still come out set
        let existing = batch("4", "2", "1", "1");
        let patch = UpdateInventoryBatchRequest {
            storage_location: Some(Some(StorageLocation::Freezer)),
            ..Default::default()
        };

        let (a, u, s, d) = effective_quantities(&existing, &patch);
        assert!(validate_quantities(a, Some(u), Some(s), Some(d)).unwrap().is_some());
    }

    #[test]
    fn patch_cannot_shrink_added_below_accounted() {
        let existing = batch("10", "6", "2", "1");
        let patch = UpdateInventoryBatchRequest {
            quantity_added: Some(dec("8")),
            ..Default::default()
        };

        let (a, u, s, d) = effective_quantities(&existing, &patch);
        assert!(validate_quantities(a, Some(u), Some(s), Some(d)).is_err());
    }
}
