use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::product::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::error::{map_unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::product::Product;
use crate::state::AppState;

const PRODUCT_COLUMNS: &str = "id, user_id, name, brand, size, unit, product_type, barcode, \
    default_storage_location, shelf_life_days, created_at, updated_at";

const BARCODE_TAKEN: &str = "A product with this barcode already exists";

async fn load_product(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> Result<Option<Product>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND user_id = $2"
    ))
    .bind(product_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

// GET /products - list the caller's products
#[instrument(skip_all)]
pub async fn list_products(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 200);

    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE user_id = $1
         ORDER BY name ASC
         OFFSET $2 LIMIT $3"
    ))
    .bind(auth.user_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

// GET /products/:id
pub async fn get_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = load_product(&db_pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    Ok(Json(product.into()))
}

// GET /products/by-barcode/:barcode
pub async fn get_product_by_barcode(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(barcode): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE user_id = $1 AND barcode = $2"
    ))
    .bind(auth.user_id)
    .bind(&barcode)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found(format!("Product with barcode {barcode} not found")))?;

    Ok(Json(product.into()))
}

// POST /products
#[instrument(skip_all)]
pub async fn create_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products
            (user_id, name, brand, size, unit, product_type, barcode,
             default_storage_location, shelf_life_days)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(auth.user_id)
    .bind(&req.name)
    .bind(&req.brand)
    .bind(&req.size)
    .bind(&req.unit)
    .bind(req.product_type)
    .bind(&req.barcode)
    .bind(req.default_storage_location)
    .bind(req.shelf_life_days)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_unique_violation(e, BARCODE_TAKEN))?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

// PATCH /products/:id - partial update; absent fields keep stored values,
// explicit nulls reset nullable columns
pub async fn update_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = load_product(&db_pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    let name = patch.name.unwrap_or(product.name);
    let brand = patch.brand.unwrap_or(product.brand);
    let size = patch.size.unwrap_or(product.size);
    let unit = patch.unit.unwrap_or(product.unit);
    let product_type = patch.product_type.unwrap_or(product.product_type);
    let barcode = patch.barcode.unwrap_or(product.barcode);
    let default_storage_location = patch
        .default_storage_location
        .unwrap_or(product.default_storage_location);
    let shelf_life_days = patch.shelf_life_days.unwrap_or(product.shelf_life_days);

    let updated = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
            name = $1, brand = $2, size = $3, unit = $4, product_type = $5,
            barcode = $6, default_storage_location = $7, shelf_life_days = $8,
            updated_at = now()
         WHERE id = $9 AND user_id = $10
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&name)
    .bind(&brand)
    .bind(&size)
    .bind(&unit)
    .bind(product_type)
    .bind(&barcode)
    .bind(default_storage_location)
    .bind(shelf_life_days)
    .bind(id)
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_unique_violation(e, BARCODE_TAKEN))?;

    Ok(Json(updated.into()))
}

// DELETE /products/:id - 204 whether or not a row existed
pub async fn delete_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    sqlx::query("DELETE FROM products WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                // batches reference products with RESTRICT
                if db_err.code().as_deref() == Some("23503") {
                    return AppError::conflict("Product is referenced by inventory batches");
                }
            }
            AppError::db(e)
        })?;

    Ok(StatusCode::NO_CONTENT)
}
