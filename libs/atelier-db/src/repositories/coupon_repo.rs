use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::coupon::Coupon;

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Coupon>> {
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list coupons")
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch coupon")
    }

    /// Plain insert for admin-created promotional codes. Returns the raw
    /// sqlx error so callers can tell a duplicate code apart from an
    /// unavailable database.
    pub async fn create(
        &self,
        code: &str,
        kind: &str,
        amount: i64,
        usage_limit: i32,
    ) -> std::result::Result<Coupon, sqlx::Error> {
        sqlx::query_as::<_, Coupon>(
            "INSERT INTO coupons (code, kind, amount, usage_limit)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(code)
        .bind(kind)
        .bind(amount)
        .bind(usage_limit)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn deactivate(&self, code: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE coupons SET is_active = FALSE WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .context("Failed to deactivate coupon")?;
        Ok(result.rows_affected() > 0)
    }
}
