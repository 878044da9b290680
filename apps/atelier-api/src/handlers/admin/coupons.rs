use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use atelier_db::models::coupon::{Coupon, KIND_PERCENTAGE, is_valid_kind};

use crate::AppState;
use crate::error::ApiError;
use crate::services::coupon_service::is_unique_violation;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>, ApiError> {
    Ok(Json(state.coupon_repo.list().await?))
}

/// Public promotional codes, created by hand. Subscriber coupons come
/// from the issuance flow instead.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
    pub kind: String,
    pub amount: i64,
    pub usage_limit: Option<i32>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<CouponForm>,
) -> Result<Json<Coupon>, ApiError> {
    let kind = form.kind.trim().to_lowercase();
    if !is_valid_kind(&kind) {
        return Err(ApiError::Validation(
            "kind must be 'percentage' or 'fixed'".to_string(),
        ));
    }
    if form.amount < 0 {
        return Err(ApiError::Validation(
            "amount must not be negative".to_string(),
        ));
    }
    if kind == KIND_PERCENTAGE && form.amount > 100 {
        return Err(ApiError::Validation(
            "percentage amount must be between 0 and 100".to_string(),
        ));
    }
    let usage_limit = form.usage_limit.unwrap_or(1);
    if usage_limit <= 0 {
        return Err(ApiError::Validation(
            "usage_limit must be greater than 0".to_string(),
        ));
    }
    let code = form.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(ApiError::Validation("code must not be empty".to_string()));
    }

    match state
        .coupon_repo
        .create(&code, &kind, form.amount, usage_limit)
        .await
    {
        Ok(coupon) => Ok(Json(coupon)),
        Err(e) if is_unique_violation(&e) => Err(ApiError::Validation(
            "coupon code already exists".to_string(),
        )),
        Err(e) => {
            error!("Failed to create coupon: {e}");
            Err(ApiError::Internal(
                anyhow::Error::new(e).context("Failed to create coupon"),
            ))
        }
    }
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.coupon_repo.deactivate(&code).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound("coupon"))
    }
}
