use chrono::{Duration, TimeZone, Utc};

use storefront_core::domain::category::{Category, CategoryId};
use storefront_core::domain::product::{Product, ProductId};

use crate::repositories::{CatalogRepository, RepositoryError};

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price: &'static str,
    original_price: Option<&'static str>,
    category: &'static str,
    rating: &'static str,
    review_count: i64,
    tags: &'static [&'static str],
}

const SEED_CATEGORIES: &[(&str, &str)] = &[
    ("electronics", "Electronics"),
    ("books", "Books"),
    ("sports", "Sports & Outdoors"),
    ("home", "Home & Kitchen"),
];

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "prod-headphones",
        name: "Wireless Headphones",
        description: "Over-ear noise-canceling headphones with 30h battery life",
        price: "199.99",
        original_price: Some("249.99"),
        category: "electronics",
        rating: "4.7",
        review_count: 412,
        tags: &["wireless", "audio", "noise-canceling"],
    },
    SeedProduct {
        id: "prod-keyboard",
        name: "Mechanical Keyboard",
        description: "Hot-swappable mechanical keyboard with RGB backlight",
        price: "129.00",
        original_price: None,
        category: "electronics",
        rating: "4.5",
        review_count: 188,
        tags: &["keyboard", "gaming", "rgb"],
    },
    SeedProduct {
        id: "prod-earbuds",
        name: "True Wireless Earbuds",
        description: "Compact earbuds with wireless charging case",
        price: "89.99",
        original_price: Some("109.99"),
        category: "electronics",
        rating: "4.3",
        review_count: 957,
        tags: &["wireless", "audio", "compact"],
    },
    SeedProduct {
        id: "prod-smartwatch",
        name: "Fitness Smartwatch",
        description: "Heart-rate and sleep tracking with 7-day battery",
        price: "159.00",
        original_price: None,
        category: "electronics",
        rating: "4.4",
        review_count: 301,
        tags: &["wearable", "fitness"],
    },
    SeedProduct {
        id: "prod-scifi-novel",
        name: "The Silent Orbit",
        description: "A hard science fiction novel about a derelict station",
        price: "14.99",
        original_price: None,
        category: "books",
        rating: "4.6",
        review_count: 2210,
        tags: &["sci-fi", "fiction"],
    },
    SeedProduct {
        id: "prod-cookbook",
        name: "Weeknight Kitchen",
        description: "120 recipes you can cook in under 30 minutes",
        price: "24.50",
        original_price: Some("29.99"),
        category: "books",
        rating: "4.8",
        review_count: 845,
        tags: &["cooking", "recipes"],
    },
    SeedProduct {
        id: "prod-rust-book",
        name: "Systems Programming in Practice",
        description: "A practitioner's guide to building reliable system software",
        price: "44.99",
        original_price: None,
        category: "books",
        rating: "4.9",
        review_count: 132,
        tags: &["programming", "non-fiction"],
    },
    SeedProduct {
        id: "prod-yoga-mat",
        name: "Non-Slip Yoga Mat",
        description: "6mm cushioned mat with carrying strap",
        price: "29.99",
        original_price: None,
        category: "sports",
        rating: "4.5",
        review_count: 1523,
        tags: &["yoga", "fitness"],
    },
    SeedProduct {
        id: "prod-dumbbells",
        name: "Adjustable Dumbbell Pair",
        description: "5-25kg adjustable dumbbells with quick-change dial",
        price: "249.00",
        original_price: Some("299.00"),
        category: "sports",
        rating: "4.6",
        review_count: 287,
        tags: &["strength", "fitness", "home-gym"],
    },
    SeedProduct {
        id: "prod-water-bottle",
        name: "Insulated Water Bottle",
        description: "750ml stainless bottle, keeps drinks cold for 24h",
        price: "22.00",
        original_price: None,
        category: "sports",
        rating: "4.7",
        review_count: 3104,
        tags: &["hydration", "outdoors"],
    },
    SeedProduct {
        id: "prod-chef-knife",
        name: "8-Inch Chef Knife",
        description: "Forged high-carbon steel knife with full tang",
        price: "79.00",
        original_price: None,
        category: "home",
        rating: "4.8",
        review_count: 672,
        tags: &["kitchen", "cooking"],
    },
    SeedProduct {
        id: "prod-french-press",
        name: "Glass French Press",
        description: "1L borosilicate french press with steel filter",
        price: "34.99",
        original_price: Some("39.99"),
        category: "home",
        rating: "4.4",
        review_count: 419,
        tags: &["coffee", "kitchen"],
    },
];

#[derive(Debug)]
pub struct SeedResult {
    pub categories: usize,
    pub products: usize,
}

/// Loads the deterministic demo catalog. Idempotent: saves are upserts, so
/// reseeding an already seeded store is a no-op.
pub async fn seed_demo_catalog(
    catalog: &dyn CatalogRepository,
) -> Result<SeedResult, RepositoryError> {
    for (id, name) in SEED_CATEGORIES {
        catalog
            .save_category(Category {
                id: CategoryId((*id).to_string()),
                name: (*name).to_string(),
                slug: (*id).to_string(),
            })
            .await?;
    }

    // Stable created_at values keep default listing order deterministic.
    let base = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    for (index, seed) in SEED_PRODUCTS.iter().enumerate() {
        catalog
            .save_product(Product {
                id: ProductId(seed.id.to_string()),
                name: seed.name.to_string(),
                description: seed.description.to_string(),
                price: seed.price.to_string(),
                original_price: seed.original_price.map(str::to_string),
                image_url: None,
                category_id: Some(CategoryId(seed.category.to_string())),
                stock: Some(50),
                rating: Some(seed.rating.to_string()),
                review_count: Some(seed.review_count),
                tags: Some(seed.tags.iter().map(|t| (*t).to_string()).collect()),
                is_active: true,
                created_at: base + Duration::minutes(index as i64),
            })
            .await?;
    }

    Ok(SeedResult { categories: SEED_CATEGORIES.len(), products: SEED_PRODUCTS.len() })
}
