use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use atelier_db::models::catalog::{CategoryTree, Product};

use crate::AppState;
use crate::error::ApiError;
use crate::services::coupon_service::normalize_email;
use crate::services::order_service::{NewOrder, PlacedOrder};

pub async fn get_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryTree>>, ApiError> {
    Ok(Json(state.catalog.tree().await?))
}

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .catalog_repo
        .list_products(filter.category_id, filter.subcategory_id, false)
        .await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .catalog_repo
        .get_product(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(ApiError::NotFound("product"))?;
    Ok(Json(product))
}

pub async fn get_popup(State(state): State<AppState>) -> Json<Value> {
    let marketing = state.settings.marketing_config().await;
    Json(json!({
        "enabled": marketing.popup_enabled,
        "title": marketing.popup_title,
        "text": marketing.popup_text,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// `{ success, coupon_code }` for both first-time and repeat
/// subscriptions; resubmitting an address is not an error.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = normalize_email(&payload.email)
        .ok_or_else(|| ApiError::Validation("a valid email address is required".to_string()))?;

    let code = state.coupons.subscribe(&email).await?;
    Ok(Json(json!({ "success": true, "coupon_code": code })))
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<PlacedOrder>, ApiError> {
    Ok(Json(state.orders.place(payload).await?))
}
