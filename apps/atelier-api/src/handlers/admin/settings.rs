use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use atelier_db::models::coupon::is_valid_kind;

use crate::AppState;
use crate::error::ApiError;

pub async fn list(State(state): State<AppState>) -> Result<Json<HashMap<String, String>>, ApiError> {
    Ok(Json(state.settings.all().await?))
}

/// Bulk upsert; the settings cache is invalidated on the way out so the
/// storefront picks the new values up immediately.
pub async fn update(
    State(state): State<AppState>,
    Json(values): Json<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    if values.is_empty() {
        return Err(ApiError::Validation("no settings provided".to_string()));
    }

    if let Some(kind) = values.get("coupon_kind") {
        if !is_valid_kind(kind) {
            return Err(ApiError::Validation(
                "coupon_kind must be 'percentage' or 'fixed'".to_string(),
            ));
        }
    }
    if let Some(amount) = values.get("coupon_amount") {
        match amount.parse::<i64>() {
            Ok(v) if v >= 0 => {}
            _ => {
                return Err(ApiError::Validation(
                    "coupon_amount must be a non-negative integer".to_string(),
                ));
            }
        }
    }

    state.settings.set_multiple(values).await?;
    Ok(Json(json!({ "success": true })))
}
