use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;

use atelier_db::models::order::{Order, status};
use atelier_db::repositories::catalog_repo::CatalogRepository;
use atelier_db::repositories::order_repo::OrderRepository;

use crate::error::ApiError;
use crate::services::coupon_service::{ConsumeError, CouponService};
use crate::services::notification;
use crate::services::settings_service::SettingsService;

#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub note: Option<String>,
    pub coupon_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub whatsapp_link: Option<String>,
}

pub struct OrderService {
    pool: PgPool,
    orders: OrderRepository,
    catalog: CatalogRepository,
    coupons: Arc<CouponService>,
    settings: Arc<SettingsService>,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        orders: OrderRepository,
        catalog: CatalogRepository,
        coupons: Arc<CouponService>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            pool,
            orders,
            catalog,
            coupons,
            settings,
        }
    }

    /// Checkout. Prices and titles are snapshotted into the order, the
    /// optional coupon is consumed inside the same transaction as the
    /// order insert, and a refused code rejects the whole order so the
    /// shopper can retry without it.
    pub async fn place(&self, req: NewOrder) -> Result<PlacedOrder, ApiError> {
        let customer_name = required(&req.customer_name, "customer_name")?;
        let phone = required(&req.phone, "phone")?;
        let address = required(&req.address, "address")?;
        let city = required(&req.city, "city")?;

        if req.items.is_empty() {
            return Err(ApiError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        // Repeated product lines collapse into one with the quantities
        // summed.
        let mut quantities: BTreeMap<i64, i64> = BTreeMap::new();
        for item in &req.items {
            if item.quantity <= 0 {
                return Err(ApiError::Validation(
                    "item quantity must be positive".to_string(),
                ));
            }
            *quantities.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
        }

        let ids: Vec<i64> = quantities.keys().copied().collect();
        let products = self.catalog.get_active_products_by_ids(&ids).await?;
        if products.len() != ids.len() {
            return Err(ApiError::Validation(
                "order references an unknown or inactive product".to_string(),
            ));
        }

        let subtotal: i64 = products
            .iter()
            .map(|p| p.price * quantities[&p.id])
            .sum();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin order transaction")?;

        let mut discount = 0i64;
        let mut applied_code: Option<String> = None;
        let coupon_code = req
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        if let Some(code) = coupon_code {
            match self.coupons.consume(&mut *tx, code, subtotal).await {
                Ok(amount) => {
                    discount = amount;
                    applied_code = Some(code.to_string());
                }
                Err(ConsumeError::Rejected(reason)) => return Err(reason.into()),
                Err(ConsumeError::Unavailable(e)) => {
                    // The sale still goes through; the shopper just
                    // loses the discount while coupon storage is down.
                    // The aborted transaction cannot be reused.
                    warn!("coupon step failed, placing order without discount: {e}");
                    drop(tx);
                    tx = self
                        .pool
                        .begin()
                        .await
                        .context("Failed to restart order transaction")?;
                }
            }
        }

        let total = subtotal - discount;

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (customer_name, phone, address, city, note, coupon_code, subtotal, discount, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(customer_name)
        .bind(phone)
        .bind(address)
        .bind(city)
        .bind(req.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(applied_code.as_deref())
        .bind(subtotal)
        .bind(discount)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create order")?;

        for product in &products {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, title, unit_price, quantity)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(product.id)
            .bind(&product.title)
            .bind(product.price)
            .bind(quantities[&product.id] as i32)
            .execute(&mut *tx)
            .await
            .context("Failed to insert order item")?;
        }

        tx.commit().await.context("Failed to commit order")?;

        let order = self
            .orders
            .get_with_items(order_id)
            .await?
            .context("order missing right after insert")?;

        let store_whatsapp = self.settings.get_or_default("store_whatsapp", "").await;
        let whatsapp_link = notification::order_link(&store_whatsapp, &order);

        Ok(PlacedOrder {
            order,
            whatsapp_link,
        })
    }

    pub async fn list(&self, status_filter: Option<&str>) -> Result<Vec<Order>, ApiError> {
        if let Some(s) = status_filter {
            if !status::is_valid(s) {
                return Err(ApiError::Validation(format!("unknown order status '{s}'")));
            }
        }
        Ok(self.orders.list(status_filter).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Order, ApiError> {
        self.orders
            .get_with_items(id)
            .await?
            .ok_or(ApiError::NotFound("order"))
    }

    pub async fn update_status(&self, id: i64, new_status: &str) -> Result<Order, ApiError> {
        if !status::is_valid(new_status) {
            return Err(ApiError::Validation(format!(
                "unknown order status '{new_status}'"
            )));
        }

        let order = self.get(id).await?;
        if !status::can_transition(&order.status, new_status) {
            return Err(ApiError::Validation(format!(
                "cannot move order from '{}' to '{new_status}'",
                order.status
            )));
        }

        let updated = self
            .orders
            .update_status_if(id, &order.status, new_status)
            .await?;
        if !updated {
            return Err(ApiError::Validation(
                "order status changed concurrently, reload and retry".to_string(),
            ));
        }

        self.get(id).await
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
