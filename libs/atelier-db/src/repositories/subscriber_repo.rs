use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::subscriber::Subscriber;

#[derive(Debug, Clone)]
pub struct SubscriberRepository {
    pool: PgPool,
}

impl SubscriberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Subscriber>> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list subscribers")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch subscriber by email")
    }
}
