use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use atelier_db::models::order::Order;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list(filter.status.as_deref()).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<StatusForm>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.update_status(id, &form.status).await?))
}
