use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::order::{Order, OrderItem};

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Order>> {
        let mut orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list orders")?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch order items")?;

        for order in &mut orders {
            order.items = items
                .iter()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect();
        }

        Ok(orders)
    }

    pub async fn get_with_items(&self, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch order")?;

        let Some(mut order) = order else {
            return Ok(None);
        };

        order.items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch order items")?;

        Ok(Some(order))
    }

    /// Conditional on the current status so two admins racing on the
    /// same order cannot both win.
    pub async fn update_status_if(&self, id: i64, from: &str, to: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to)
            .bind(id)
            .bind(from)
            .execute(&self.pool)
            .await
            .context("Failed to update order status")?;
        Ok(result.rows_affected() > 0)
    }
}
