use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::warn;

use atelier_db::models::coupon::{KIND_PERCENTAGE, is_valid_kind};

use crate::cache::TtlCache;

const CACHE_PREFIX: &str = "settings:";

/// Marketing knobs read on every subscribe/popup request, so they come
/// out of the TTL cache rather than the database each time.
#[derive(Debug, Clone)]
pub struct MarketingConfig {
    pub coupon_prefix: String,
    pub coupon_kind: String,
    pub coupon_amount: i64,
    pub popup_enabled: bool,
    pub popup_title: String,
    pub popup_text: String,
    pub store_whatsapp: String,
}

pub struct SettingsService {
    pool: PgPool,
    cache: TtlCache<String>,
    ttl: Duration,
}

impl SettingsService {
    pub fn new(pool: PgPool, cache: TtlCache<String>, ttl: Duration) -> Self {
        Self { pool, cache, ttl }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let cache_key = format!("{CACHE_PREFIX}{key}");
        if let Some(value) = self.cache.get(&cache_key).await {
            return Ok(Some(value));
        }

        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch setting")?;

        if let Some(ref value) = value {
            self.cache.insert(cache_key, value.clone(), self.ttl).await;
        }

        Ok(value)
    }

    pub async fn get_or_default(&self, key: &str, default: &str) -> String {
        match self.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(e) => {
                warn!("falling back to default for setting '{key}': {e:#}");
                default.to_string()
            }
        }
    }

    pub async fn all(&self) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key ASC")
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch settings")?;
        Ok(rows.into_iter().collect())
    }

    pub async fn set_multiple(&self, settings: HashMap<String, String>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in &settings {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = now()",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .context(format!("Failed to update setting {key}"))?;
        }

        tx.commit().await?;

        self.cache.invalidate_pattern(CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn marketing_config(&self) -> MarketingConfig {
        let coupon_kind = self.get_or_default("coupon_kind", KIND_PERCENTAGE).await;
        let coupon_kind = if is_valid_kind(&coupon_kind) {
            coupon_kind
        } else {
            warn!("setting coupon_kind holds unknown value '{coupon_kind}', using percentage");
            KIND_PERCENTAGE.to_string()
        };

        MarketingConfig {
            coupon_prefix: self.get_or_default("coupon_prefix", "WELCOME").await,
            coupon_kind,
            coupon_amount: self
                .get_or_default("coupon_amount", "10")
                .await
                .parse()
                .unwrap_or(10),
            popup_enabled: self.get_or_default("popup_enabled", "true").await == "true",
            popup_title: self.get_or_default("popup_title", "").await,
            popup_text: self.get_or_default("popup_text", "").await,
            store_whatsapp: self.get_or_default("store_whatsapp", "").await,
        }
    }
}
