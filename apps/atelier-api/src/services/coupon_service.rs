use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rand::distr::{Alphanumeric, SampleString};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;

use atelier_db::models::coupon::{Coupon, KIND_FIXED, KIND_PERCENTAGE, RedeemError};
use atelier_db::repositories::subscriber_repo::SubscriberRepository;

use crate::services::settings_service::SettingsService;

/// Length of the random suffix appended to the configured prefix.
pub const CODE_SUFFIX_LEN: usize = 8;

/// Generate-and-insert rounds before issuance gives up. Uniqueness is
/// the coupons primary key; a collision shows up as a constraint
/// violation, never as a stale existence check.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Candidate codes are brandable (configured prefix) and hard to guess
/// (random upper-cased alphanumeric tail). Not unique by construction;
/// the database constraint settles that.
pub fn candidate_code<R: rand::Rng>(prefix: &str, rng: &mut R) -> String {
    let suffix = Alphanumeric.sample_string(rng, CODE_SUFFIX_LEN);
    format!("{}{}", prefix.trim().to_uppercase(), suffix.to_uppercase())
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(email)
}

/// Whole currency units; the storefront's currency has no minor unit in
/// use. Percentage discounts round half-up, fixed discounts are capped
/// at the subtotal so a total can never go negative.
pub fn compute_discount(kind: &str, amount: i64, subtotal: i64) -> i64 {
    match kind {
        KIND_PERCENTAGE => (subtotal * amount + 50) / 100,
        KIND_FIXED => amount.min(subtotal),
        _ => 0,
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Distinguishes a refused code (shopper-facing reason, order is
/// rejected) from unavailable coupon storage (order proceeds without a
/// discount).
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error(transparent)]
    Rejected(#[from] RedeemError),
    #[error("coupon storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

enum IssueOutcome {
    Issued,
    CodeTaken,
    EmailTaken,
}

pub struct CouponService {
    pool: PgPool,
    subscribers: SubscriberRepository,
    settings: Arc<SettingsService>,
}

impl CouponService {
    pub fn new(
        pool: PgPool,
        subscribers: SubscriberRepository,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            pool,
            subscribers,
            settings,
        }
    }

    /// Issues a single-use coupon to a new subscriber. Idempotent: a
    /// repeat subscription returns the code issued the first time
    /// instead of minting a second coupon.
    pub async fn subscribe(&self, email: &str) -> Result<String> {
        if let Some(existing) = self.subscribers.get_by_email(email).await? {
            return Ok(existing.coupon_code);
        }

        let marketing = self.settings.marketing_config().await;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = candidate_code(&marketing.coupon_prefix, &mut rand::rng());
            match self
                .issue(email, &code, &marketing.coupon_kind, marketing.coupon_amount)
                .await?
            {
                IssueOutcome::Issued => {
                    info!("issued coupon {code} to new subscriber");
                    return Ok(code);
                }
                IssueOutcome::CodeTaken => continue,
                IssueOutcome::EmailTaken => {
                    // Lost a race against a concurrent signup for the
                    // same address; hand back the code that won.
                    let existing = self
                        .subscribers
                        .get_by_email(email)
                        .await?
                        .context("subscriber missing after duplicate-email conflict")?;
                    return Ok(existing.coupon_code);
                }
            }
        }

        bail!("could not allocate a unique coupon code after {MAX_CODE_ATTEMPTS} attempts")
    }

    /// Coupon and subscriber are written as one transaction; a failure
    /// on either side leaves no orphan row behind.
    async fn issue(&self, email: &str, code: &str, kind: &str, amount: i64) -> Result<IssueOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin issuance transaction")?;

        let coupon_insert = sqlx::query(
            "INSERT INTO coupons (code, kind, amount, usage_limit) VALUES ($1, $2, $3, 1)",
        )
        .bind(code)
        .bind(kind)
        .bind(amount)
        .execute(&mut *tx)
        .await;

        match coupon_insert {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(IssueOutcome::CodeTaken),
            Err(e) => return Err(e).context("Failed to insert coupon"),
        }

        let subscriber_insert =
            sqlx::query("INSERT INTO subscribers (email, coupon_code) VALUES ($1, $2)")
                .bind(email)
                .bind(code)
                .execute(&mut *tx)
                .await;

        match subscriber_insert {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(IssueOutcome::EmailTaken),
            Err(e) => return Err(e).context("Failed to insert subscriber"),
        }

        tx.commit().await.context("Failed to commit issuance")?;
        Ok(IssueOutcome::Issued)
    }

    /// Applies and consumes a coupon in one conditional update, inside
    /// the caller's order transaction: the usage count can never pass
    /// the limit, even under concurrent redemption of the same code,
    /// and a rolled-back order rolls the consumption back with it.
    /// The code must match exactly as stored.
    pub async fn consume(
        &self,
        conn: &mut PgConnection,
        code: &str,
        subtotal: i64,
    ) -> std::result::Result<i64, ConsumeError> {
        let applied = sqlx::query_as::<_, Coupon>(
            "UPDATE coupons SET used_count = used_count + 1
             WHERE code = $1 AND is_active = TRUE AND used_count < usage_limit
             RETURNING *",
        )
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(coupon) = applied {
            return Ok(compute_discount(&coupon.kind, coupon.amount, subtotal));
        }

        // The conditional update matched nothing; look the code up once
        // more to name the reason.
        let existing = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;

        match existing {
            None => Err(RedeemError::NotFound.into()),
            Some(c) if !c.is_active => Err(RedeemError::Inactive.into()),
            Some(_) => Err(RedeemError::Exhausted.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn candidate_code_is_prefix_plus_uppercase_suffix() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = candidate_code("welcome", &mut rng);

        assert!(code.starts_with("WELCOME"));
        assert_eq!(code.len(), "WELCOME".len() + CODE_SUFFIX_LEN);
        let suffix = &code["WELCOME".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn candidate_codes_do_not_collide_over_many_trials() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(candidate_code("SALE", &mut rng)));
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email("  Shopper@Example.COM "),
            Some("shopper@example.com".to_string())
        );
        assert_eq!(normalize_email("no-at-sign"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("shopper@"), None);
        assert_eq!(normalize_email(""), None);
    }

    #[test]
    fn percentage_discount_rounds_to_whole_units() {
        assert_eq!(compute_discount(KIND_PERCENTAGE, 12, 1000), 120);
        // 2.5 rounds half-up to 3.
        assert_eq!(compute_discount(KIND_PERCENTAGE, 25, 10), 3);
        assert_eq!(compute_discount(KIND_PERCENTAGE, 33, 10), 3);
        assert_eq!(compute_discount(KIND_PERCENTAGE, 0, 1000), 0);
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        assert_eq!(compute_discount(KIND_FIXED, 200, 150), 150);
        assert_eq!(compute_discount(KIND_FIXED, 200, 1000), 200);
        assert_eq!(compute_discount(KIND_FIXED, 0, 1000), 0);
    }
}
