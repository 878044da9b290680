use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::admin::Admin;

#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Admin>> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch admin by username")
    }

    pub async fn exists(&self, username: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check admin existence")
    }
}
