use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use storefront_core::domain::behavior::{BehaviorEvent, BehaviorEventInput};
use storefront_core::domain::category::Category;
use storefront_core::domain::product::{Product, ProductFilter, ProductId};

use super::{BehaviorRepository, CatalogRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    products: RwLock<HashMap<String, Product>>,
    categories: RwLock<HashMap<String, Category>>,
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(category_id) = &filter.category_id {
        if product.category_id.as_ref() != Some(category_id) {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let in_name = product.name.to_lowercase().contains(&needle);
        let in_description = product.description.to_lowercase().contains(&needle);
        let in_tags =
            product.tag_slice().iter().any(|tag| tag.to_lowercase().contains(&needle));
        if !in_name && !in_description && !in_tags {
            return false;
        }
    }
    if filter.min_price.is_some() || filter.max_price.is_some() {
        let Some(price) = product.parsed_price() else { return false };
        if let Some(min) = filter.min_price.as_ref().and_then(decimal_to_f64) {
            if price < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price.as_ref().and_then(decimal_to_f64) {
            if price > max {
                return false;
            }
        }
    }
    true
}

fn decimal_to_f64(value: &rust_decimal::Decimal) -> Option<f64> {
    rust_decimal::prelude::ToPrimitive::to_f64(value)
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut results: Vec<Product> =
            products.values().filter(|p| matches_filter(p, filter)).cloned().collect();
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(results)
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = self.categories.read().await;
        let mut results: Vec<Category> = categories.values().cloned().collect();
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(results)
    }

    async fn save_category(&self, category: Category) -> Result<(), RepositoryError> {
        let mut categories = self.categories.write().await;
        categories.insert(category.id.0.clone(), category);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBehaviorRepository {
    events: RwLock<Vec<BehaviorEvent>>,
}

#[async_trait::async_trait]
impl BehaviorRepository for InMemoryBehaviorRepository {
    async fn record(&self, input: BehaviorEventInput) -> Result<BehaviorEvent, RepositoryError> {
        let event = BehaviorEvent {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            product_id: input.product_id,
            action: input.action,
            timestamp: Utc::now(),
        };
        let mut events = self.events.write().await;
        events.push(event.clone());
        Ok(event)
    }

    async fn list_all(&self) -> Result<Vec<BehaviorEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events.clone())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<BehaviorEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events.iter().filter(|event| event.user_id == user_id).cloned().collect())
    }
}
