use async_trait::async_trait;
use thiserror::Error;

use storefront_core::domain::behavior::{BehaviorEvent, BehaviorEventInput};
use storefront_core::domain::category::Category;
use storefront_core::domain::product::{Product, ProductFilter, ProductId};

pub mod behavior;
pub mod catalog;
pub mod memory;

pub use behavior::SqlBehaviorRepository;
pub use catalog::SqlCatalogRepository;
pub use memory::{InMemoryBehaviorRepository, InMemoryCatalogRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn save_product(&self, product: Product) -> Result<(), RepositoryError>;
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn save_category(&self, category: Category) -> Result<(), RepositoryError>;
}

/// Append-only behavior log. The store assigns event ids and timestamps at
/// write time.
#[async_trait]
pub trait BehaviorRepository: Send + Sync {
    async fn record(&self, input: BehaviorEventInput) -> Result<BehaviorEvent, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<BehaviorEvent>, RepositoryError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<BehaviorEvent>, RepositoryError>;
}
