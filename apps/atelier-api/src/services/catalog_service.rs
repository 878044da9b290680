use std::time::Duration;

use anyhow::Result;

use atelier_db::models::catalog::{Category, CategoryTree, SubCategory};
use atelier_db::repositories::catalog_repo::CatalogRepository;

use crate::cache::TtlCache;

const TREE_KEY: &str = "catalog:tree";

/// Category/subcategory reads go through the TTL cache; every catalog
/// mutation funnels through here so the invalidation cannot be missed.
pub struct CatalogService {
    repo: CatalogRepository,
    cache: TtlCache<Vec<CategoryTree>>,
    ttl: Duration,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, cache: TtlCache<Vec<CategoryTree>>, ttl: Duration) -> Self {
        Self { repo, cache, ttl }
    }

    pub async fn tree(&self) -> Result<Vec<CategoryTree>> {
        if let Some(tree) = self.cache.get(TREE_KEY).await {
            return Ok(tree);
        }

        let categories = self.repo.list_categories().await?;
        let subcategories = self.repo.list_subcategories().await?;

        let tree: Vec<CategoryTree> = categories
            .into_iter()
            .map(|category| {
                let subcategories = subcategories
                    .iter()
                    .filter(|s| s.category_id == category.id)
                    .cloned()
                    .collect();
                CategoryTree {
                    category,
                    subcategories,
                }
            })
            .collect();

        self.cache.insert(TREE_KEY, tree.clone(), self.ttl).await;
        Ok(tree)
    }

    pub async fn create_category(&self, title: &str) -> Result<Category> {
        let category = self.repo.create_category(title).await?;
        self.invalidate().await;
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, title: &str) -> Result<Option<Category>> {
        let category = self.repo.update_category(id, title).await?;
        self.invalidate().await;
        Ok(category)
    }

    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        let deleted = self.repo.delete_category(id).await?;
        self.invalidate().await;
        Ok(deleted)
    }

    /// Returns `None` when the parent category does not exist.
    pub async fn create_subcategory(
        &self,
        category_id: i64,
        title: &str,
    ) -> Result<Option<SubCategory>> {
        if self.repo.get_category(category_id).await?.is_none() {
            return Ok(None);
        }
        let subcategory = self.repo.create_subcategory(category_id, title).await?;
        self.invalidate().await;
        Ok(Some(subcategory))
    }

    pub async fn update_subcategory(&self, id: i64, title: &str) -> Result<Option<SubCategory>> {
        let subcategory = self.repo.update_subcategory(id, title).await?;
        self.invalidate().await;
        Ok(subcategory)
    }

    pub async fn delete_subcategory(&self, id: i64) -> Result<bool> {
        let deleted = self.repo.delete_subcategory(id).await?;
        self.invalidate().await;
        Ok(deleted)
    }

    async fn invalidate(&self) {
        self.cache.invalidate_pattern("catalog").await;
    }
}
