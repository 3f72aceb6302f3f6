/**
 * Category Routes
 * List is public; create, rename and delete are admin-only
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, categories, models::Category};
use crate::error::AppError;
use crate::routes::auth::require_admin;
use crate::routes::SuccessResponse;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Category name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Category name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn conflict_on_duplicate(err: sqlx::Error) -> AppError {
    if db::is_unique_violation(&err) {
        AppError::Conflict("Category already exists".to_string())
    } else {
        AppError::Database(err)
    }
}

/// GET /api/categories
pub async fn list_categories() -> Result<Json<CategoryListResponse>, AppError> {
    let pool = db::require_pool()?;
    let categories = categories::list(&pool).await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// POST /api/categories
pub async fn create_category(
    headers: HeaderMap,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&headers)?;
    let name = validate_name(&payload.name)?;
    let pool = db::require_pool()?;

    let category = categories::insert(&pool, &name)
        .await
        .map_err(conflict_on_duplicate)?;
    tracing::info!(category_id = %category.id, name = %category.name, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn rename_category(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    require_admin(&headers)?;
    let name = validate_name(&payload.name)?;
    let pool = db::require_pool()?;

    let category = categories::rename(&pool, id, &name)
        .await
        .map_err(conflict_on_duplicate)?
        .ok_or_else(AppError::not_found)?;
    tracing::info!(category_id = %id, name = %category.name, "category renamed");

    Ok(Json(category))
}

/// DELETE /api/categories/{id} - posts in it become uncategorised
pub async fn delete_category(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    require_admin(&headers)?;
    let pool = db::require_pool()?;

    if !categories::delete(&pool, id).await? {
        return Err(AppError::not_found());
    }
    tracing::info!(category_id = %id, "category deleted");

    Ok(Json(SuccessResponse { success: true }))
}
