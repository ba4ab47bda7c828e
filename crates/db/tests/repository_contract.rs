//! Contract checks shared by the SQL and in-memory repository backends.
//! Both must behave identically through the repository traits so the server
//! can swap backends without observable differences.

use chrono::Utc;

use storefront_core::domain::behavior::BehaviorEventInput;
use storefront_core::domain::category::{Category, CategoryId};
use storefront_core::domain::product::{Product, ProductFilter, ProductId};
use storefront_db::repositories::{
    BehaviorRepository, CatalogRepository, InMemoryBehaviorRepository, InMemoryCatalogRepository,
    SqlBehaviorRepository, SqlCatalogRepository,
};
use storefront_db::{connect_with, ConnectionSettings, migrations};

async fn sql_pool() -> sqlx::SqlitePool {
    let pool =
        connect_with("sqlite::memory:", ConnectionSettings::for_tests()).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

fn sample_product(id: &str, category: &str, price: &str) -> Product {
    Product {
        id: ProductId(id.to_string()),
        name: format!("Product {id}"),
        description: "A sample item".to_string(),
        price: price.to_string(),
        original_price: None,
        image_url: None,
        category_id: Some(CategoryId(category.to_string())),
        stock: Some(3),
        rating: Some("4.0".to_string()),
        review_count: Some(1),
        tags: Some(vec!["sample".to_string()]),
        is_active: true,
        created_at: Utc::now(),
    }
}

async fn check_catalog_contract(repo: &dyn CatalogRepository) {
    repo.save_category(Category {
        id: CategoryId("electronics".to_string()),
        name: "Electronics".to_string(),
        slug: "electronics".to_string(),
    })
    .await
    .expect("save category");

    let product = sample_product("p-1", "electronics", "50.00");
    repo.save_product(product.clone()).await.expect("save product");

    let found = repo.find_product(&product.id).await.expect("find").expect("exists");
    assert_eq!(found.id, product.id);
    assert_eq!(found.price, product.price);
    assert_eq!(found.tags, product.tags);

    let all = repo.list_products(&ProductFilter::default()).await.expect("list");
    assert_eq!(all.len(), 1);

    let missing = repo.find_product(&ProductId("absent".to_string())).await.expect("find");
    assert_eq!(missing, None);
}

async fn check_behavior_contract(repo: &dyn BehaviorRepository) {
    let input = BehaviorEventInput::parse("u-1", Some("p-1"), "purchase").expect("input");
    let event = repo.record(input).await.expect("record");
    assert_eq!(event.user_id, "u-1");

    let for_user = repo.list_for_user("u-1").await.expect("list for user");
    assert_eq!(for_user.len(), 1);
    assert_eq!(for_user[0].id, event.id);

    let for_other = repo.list_for_user("u-2").await.expect("list other");
    assert!(for_other.is_empty());

    let all = repo.list_all().await.expect("list all");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn sql_backend_satisfies_the_catalog_contract() {
    let repo = SqlCatalogRepository::new(sql_pool().await);
    check_catalog_contract(&repo).await;
}

#[tokio::test]
async fn in_memory_backend_satisfies_the_catalog_contract() {
    let repo = InMemoryCatalogRepository::default();
    check_catalog_contract(&repo).await;
}

#[tokio::test]
async fn sql_backend_satisfies_the_behavior_contract() {
    let repo = SqlBehaviorRepository::new(sql_pool().await);
    check_behavior_contract(&repo).await;
}

#[tokio::test]
async fn in_memory_backend_satisfies_the_behavior_contract() {
    let repo = InMemoryBehaviorRepository::default();
    check_behavior_contract(&repo).await;
}
