use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::catalog::{Category, Product, SubCategory};

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY title ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")
    }

    pub async fn create_category(&self, title: &str) -> Result<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (title) VALUES ($1) RETURNING *",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create category")
    }

    pub async fn update_category(&self, id: i64, title: &str) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET title = $1 WHERE id = $2 RETURNING *",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update category")
    }

    /// Cascades to the category's subcategories and products.
    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_subcategories(&self) -> Result<Vec<SubCategory>> {
        sqlx::query_as::<_, SubCategory>(
            "SELECT * FROM subcategories ORDER BY category_id ASC, title ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subcategories")
    }

    pub async fn create_subcategory(&self, category_id: i64, title: &str) -> Result<SubCategory> {
        sqlx::query_as::<_, SubCategory>(
            "INSERT INTO subcategories (category_id, title) VALUES ($1, $2) RETURNING *",
        )
        .bind(category_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create subcategory")
    }

    pub async fn update_subcategory(&self, id: i64, title: &str) -> Result<Option<SubCategory>> {
        sqlx::query_as::<_, SubCategory>(
            "UPDATE subcategories SET title = $1 WHERE id = $2 RETURNING *",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update subcategory")
    }

    pub async fn delete_subcategory(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete subcategory")?;
        Ok(result.rows_affected() > 0)
    }

    /// A product's subcategory, if set, must belong to the product's
    /// category; callers check this before writing.
    pub async fn subcategory_in_category(&self, subcategory_id: i64, category_id: i64) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subcategories WHERE id = $1 AND category_id = $2)",
        )
        .bind(subcategory_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check subcategory ownership")
    }

    pub async fn list_products(
        &self,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        include_inactive: bool,
    ) -> Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products
             WHERE ($1::BIGINT IS NULL OR category_id = $1)
               AND ($2::BIGINT IS NULL OR subcategory_id = $2)
               AND ($3 OR is_active = TRUE)
             ORDER BY created_at DESC",
        )
        .bind(category_id)
        .bind(subcategory_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch product")
    }

    pub async fn get_active_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) AND is_active = TRUE",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch products by IDs")
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_product(
        &self,
        category_id: i64,
        subcategory_id: Option<i64>,
        title: &str,
        description: &str,
        price: i64,
        image: Option<&str>,
    ) -> Result<Product> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products (category_id, subcategory_id, title, description, price, image)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(category_id)
        .bind(subcategory_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(image)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create product")
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_product(
        &self,
        id: i64,
        category_id: i64,
        subcategory_id: Option<i64>,
        title: &str,
        description: &str,
        price: i64,
        image: Option<&str>,
        is_active: bool,
    ) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(
            "UPDATE products
             SET category_id = $1, subcategory_id = $2, title = $3, description = $4,
                 price = $5, image = $6, is_active = $7
             WHERE id = $8
             RETURNING *",
        )
        .bind(category_id)
        .bind(subcategory_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(image)
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update product")
    }

    pub async fn delete_product(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete product")?;
        Ok(result.rows_affected() > 0)
    }
}
