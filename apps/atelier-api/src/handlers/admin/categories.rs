use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};

use atelier_db::models::catalog::{Category, CategoryTree, SubCategory};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CategoryForm {
    pub title: String,
}

fn clean_title(title: &str) -> Result<&str, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("title must not be empty".to_string()));
    }
    Ok(trimmed)
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategoryTree>>, ApiError> {
    Ok(Json(state.catalog.tree().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, ApiError> {
    let title = clean_title(&form.title)?;
    Ok(Json(state.catalog.create_category(title).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, ApiError> {
    let title = clean_title(&form.title)?;
    state
        .catalog
        .update_category(id, title)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("category"))
}

/// Removing a category removes its subcategories and products too.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.catalog.delete_category(id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound("category"))
    }
}

pub async fn create_subcategory(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<SubCategory>, ApiError> {
    let title = clean_title(&form.title)?;
    state
        .catalog
        .create_subcategory(category_id, title)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("category"))
}

pub async fn update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<SubCategory>, ApiError> {
    let title = clean_title(&form.title)?;
    state
        .catalog
        .update_subcategory(id, title)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("subcategory"))
}

pub async fn remove_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.catalog.delete_subcategory(id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound("subcategory"))
    }
}
