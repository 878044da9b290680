use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

pub const KIND_PERCENTAGE: &str = "percentage";
pub const KIND_FIXED: &str = "fixed";

pub fn is_valid_kind(kind: &str) -> bool {
    matches!(kind, KIND_PERCENTAGE | KIND_FIXED)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub code: String,
    pub kind: String,
    pub amount: i64,
    pub is_active: bool,
    pub usage_limit: i32,
    pub used_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.usage_limit
    }

    pub fn remaining_uses(&self) -> i32 {
        (self.usage_limit - self.used_count).max(0)
    }
}

/// Why a code was refused at redemption time. Reported to the shopper
/// verbatim; the order can be retried without the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedeemError {
    #[error("coupon code not found")]
    NotFound,
    #[error("coupon is no longer active")]
    Inactive,
    #[error("coupon has already been used")]
    Exhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_validation_accepts_only_known_kinds() {
        assert!(is_valid_kind("percentage"));
        assert!(is_valid_kind("fixed"));
        assert!(!is_valid_kind("Percentage"));
        assert!(!is_valid_kind("bogus"));
        assert!(!is_valid_kind(""));
    }

    #[test]
    fn exhaustion_tracks_usage_limit() {
        let mut coupon = Coupon {
            code: "WELCOME1234ABCD".to_string(),
            kind: KIND_PERCENTAGE.to_string(),
            amount: 10,
            is_active: true,
            usage_limit: 1,
            used_count: 0,
            created_at: Utc::now(),
        };
        assert!(!coupon.is_exhausted());
        assert_eq!(coupon.remaining_uses(), 1);

        coupon.used_count = 1;
        assert!(coupon.is_exhausted());
        assert_eq!(coupon.remaining_uses(), 0);
    }
}
