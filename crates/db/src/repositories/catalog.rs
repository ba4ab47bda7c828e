use chrono::{DateTime, Utc};
use sqlx::Row;

use storefront_core::domain::category::{Category, CategoryId};
use storefront_core::domain::product::{Product, ProductFilter, ProductId};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, original_price, image_url,
             category_id, stock, rating, review_count, tags, is_active, created_at";

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let original_price: Option<String> =
        row.try_get("original_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let image_url: Option<String> =
        row.try_get("image_url").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category_id: Option<String> =
        row.try_get("category_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let stock: Option<i64> =
        row.try_get("stock").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rating: Option<String> =
        row.try_get("rating").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let review_count: Option<i64> =
        row.try_get("review_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tags_json: Option<String> =
        row.try_get("tags").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let tags = match tags_json {
        Some(json) => Some(
            serde_json::from_str::<Vec<String>>(&json)
                .map_err(|e| RepositoryError::Decode(format!("tags for {id}: {e}")))?,
        ),
        None => None,
    };
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Product {
        id: ProductId(id),
        name,
        description,
        price,
        original_price,
        image_url,
        category_id: category_id.map(CategoryId),
        stock,
        rating,
        review_count,
        tags,
        is_active,
        created_at,
    })
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let slug: String = row.try_get("slug").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    Ok(Category { id: CategoryId(id), name, slug })
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> = sqlx::QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"
        ));

        if let Some(category_id) = &filter.category_id {
            builder.push(" AND category_id = ").push_bind(&category_id.0);
        }
        if let Some(search) = &filter.search {
            let needle = format!("%{}%", search.to_lowercase());
            builder
                .push(" AND (lower(name) LIKE ")
                .push_bind(needle.clone())
                .push(" OR lower(description) LIKE ")
                .push_bind(needle.clone())
                .push(" OR lower(IFNULL(tags, '')) LIKE ")
                .push_bind(needle)
                .push(")");
        }
        if let Some(min_price) = &filter.min_price {
            builder
                .push(" AND CAST(price AS REAL) >= CAST(")
                .push_bind(min_price.to_string())
                .push(" AS REAL)");
        }
        if let Some(max_price) = &filter.max_price {
            builder
                .push(" AND CAST(price AS REAL) <= CAST(")
                .push_bind(max_price.to_string())
                .push(" AS REAL)");
        }
        builder.push(" ORDER BY created_at ASC, id ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        let tags_json = match &product.tags {
            Some(tags) => Some(
                serde_json::to_string(tags)
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            ),
            None => None,
        };

        sqlx::query(
            "INSERT INTO products (id, name, description, price, original_price, image_url,
                                   category_id, stock, rating, review_count, tags, is_active,
                                   created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 price = excluded.price,
                 original_price = excluded.original_price,
                 image_url = excluded.image_url,
                 category_id = excluded.category_id,
                 stock = excluded.stock,
                 rating = excluded.rating,
                 review_count = excluded.review_count,
                 tags = excluded.tags,
                 is_active = excluded.is_active",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.price)
        .bind(&product.original_price)
        .bind(&product.image_url)
        .bind(product.category_id.as_ref().map(|c| c.0.as_str()))
        .bind(product.stock)
        .bind(&product.rating)
        .bind(product.review_count)
        .bind(&tags_json)
        .bind(product.is_active)
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, slug FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_category).collect::<Result<Vec<_>, _>>()
    }

    async fn save_category(&self, category: Category) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO categories (id, name, slug)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 slug = excluded.slug",
        )
        .bind(&category.id.0)
        .bind(&category.name)
        .bind(&category.slug)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
