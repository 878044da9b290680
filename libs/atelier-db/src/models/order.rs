use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub mod status {
    pub const PENDING: &str = "pending";
    pub const CONFIRMED: &str = "confirmed";
    pub const SHIPPED: &str = "shipped";
    pub const DELIVERED: &str = "delivered";
    pub const CANCELLED: &str = "cancelled";

    pub fn is_valid(status: &str) -> bool {
        matches!(
            status,
            PENDING | CONFIRMED | SHIPPED | DELIVERED | CANCELLED
        )
    }

    /// Admin-driven lifecycle: pending → confirmed → shipped → delivered,
    /// with cancellation possible from any non-terminal state.
    pub fn can_transition(from: &str, to: &str) -> bool {
        matches!(
            (from, to),
            (PENDING, CONFIRMED)
                | (CONFIRMED, SHIPPED)
                | (SHIPPED, DELIVERED)
                | (PENDING, CANCELLED)
                | (CONFIRMED, CANCELLED)
                | (SHIPPED, CANCELLED)
        )
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub note: Option<String>,
    pub coupon_code: Option<String>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub title: String,
    pub unit_price: i64,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::status;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(status::can_transition(status::PENDING, status::CONFIRMED));
        assert!(status::can_transition(status::CONFIRMED, status::SHIPPED));
        assert!(status::can_transition(status::SHIPPED, status::DELIVERED));
    }

    #[test]
    fn cancellation_is_allowed_until_terminal() {
        assert!(status::can_transition(status::PENDING, status::CANCELLED));
        assert!(status::can_transition(status::CONFIRMED, status::CANCELLED));
        assert!(status::can_transition(status::SHIPPED, status::CANCELLED));
        assert!(!status::can_transition(status::DELIVERED, status::CANCELLED));
        assert!(!status::can_transition(status::CANCELLED, status::PENDING));
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!status::can_transition(status::PENDING, status::SHIPPED));
        assert!(!status::can_transition(status::PENDING, status::DELIVERED));
        assert!(!status::can_transition(status::SHIPPED, status::CONFIRMED));
    }
}
