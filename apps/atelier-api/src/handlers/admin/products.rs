use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use atelier_db::models::catalog::Product;

use crate::AppState;
use crate::error::ApiError;
use crate::handlers::storefront::ProductFilter;

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductForm {
    async fn validate(&self, state: &AppState) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("title must not be empty".to_string()));
        }
        if self.price < 0 {
            return Err(ApiError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        if state
            .catalog_repo
            .get_category(self.category_id)
            .await?
            .is_none()
        {
            return Err(ApiError::Validation("unknown category".to_string()));
        }
        if let Some(subcategory_id) = self.subcategory_id {
            let owned = state
                .catalog_repo
                .subcategory_in_category(subcategory_id, self.category_id)
                .await?;
            if !owned {
                return Err(ApiError::Validation(
                    "subcategory does not belong to the selected category".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .catalog_repo
        .list_products(filter.category_id, filter.subcategory_id, true)
        .await?;
    Ok(Json(products))
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>, ApiError> {
    form.validate(&state).await?;
    let product = state
        .catalog_repo
        .create_product(
            form.category_id,
            form.subcategory_id,
            form.title.trim(),
            form.description.as_deref().unwrap_or("").trim(),
            form.price,
            form.image.as_deref(),
        )
        .await?;
    Ok(Json(product))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>, ApiError> {
    form.validate(&state).await?;
    state
        .catalog_repo
        .update_product(
            id,
            form.category_id,
            form.subcategory_id,
            form.title.trim(),
            form.description.as_deref().unwrap_or("").trim(),
            form.price,
            form.image.as_deref(),
            form.is_active.unwrap_or(true),
        )
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("product"))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.catalog_repo.delete_product(id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound("product"))
    }
}
