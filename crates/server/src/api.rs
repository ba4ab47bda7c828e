//! Storefront JSON API.
//!
//! - `POST /behavior`                    — record a behavior event
//! - `GET  /recommendations/{user_id}`   — personalized recommendations
//! - `GET  /products/popular`            — weighted-popularity top list
//! - `GET  /products`                    — catalog view with filters

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use storefront_core::domain::behavior::{BehaviorEvent, BehaviorEventInput};
use storefront_core::domain::category::CategoryId;
use storefront_core::domain::product::{Product, ProductFilter};
use storefront_core::domain::recommendation::RecommendationRequest;
use storefront_core::errors::{ApplicationError, InterfaceError};
use storefront_core::recs::{Recommender, Snapshot};
use storefront_db::repositories::{BehaviorRepository, CatalogRepository};

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub behavior: Arc<dyn BehaviorRepository>,
    pub recommender: Recommender,
    pub default_limit: usize,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/behavior", post(record_behavior))
        .route("/recommendations/{user_id}", get(recommendations))
        .route("/products/popular", get(popular_products))
        .route("/products", get(list_products))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorRequest {
    #[serde(default)]
    pub user_id: String,
    pub product_id: Option<String>,
    pub action: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecommendationsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn reject(error: InterfaceError) -> ApiError {
    let (status, correlation_id) = match &error {
        InterfaceError::BadRequest { correlation_id, .. } => {
            (StatusCode::BAD_REQUEST, correlation_id.clone())
        }
        InterfaceError::ServiceUnavailable { correlation_id, .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, correlation_id.clone())
        }
        InterfaceError::Internal { correlation_id, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, correlation_id.clone())
        }
    };

    warn!(
        event_name = "api.request.rejected",
        correlation_id = %correlation_id,
        error = %error,
        "request rejected"
    );

    (status, Json(ErrorBody { error: error.user_message().to_string(), correlation_id }))
}

fn storage_unavailable(
    error: storefront_db::repositories::RepositoryError,
    correlation_id: &str,
) -> ApiError {
    reject(ApplicationError::DataUnavailable(error.to_string()).into_interface(correlation_id))
}

async fn load_snapshot(state: &ApiState, correlation_id: &str) -> Result<Snapshot, ApiError> {
    let catalog = state
        .catalog
        .list_products(&ProductFilter::default())
        .await
        .map_err(|e| storage_unavailable(e, correlation_id))?;
    let events = state
        .behavior
        .list_all()
        .await
        .map_err(|e| storage_unavailable(e, correlation_id))?;
    Ok(Snapshot { events, catalog })
}

async fn record_behavior(
    State(state): State<ApiState>,
    Json(body): Json<BehaviorRequest>,
) -> Result<(StatusCode, Json<BehaviorEvent>), ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let input = BehaviorEventInput::parse(&body.user_id, body.product_id.as_deref(), &body.action)
        .map_err(|e| reject(ApplicationError::from(e).into_interface(&correlation_id)))?;

    let event = state
        .behavior
        .record(input)
        .await
        .map_err(|e| storage_unavailable(e, &correlation_id))?;

    info!(
        event_name = "api.behavior.recorded",
        correlation_id = %correlation_id,
        user_id = %event.user_id,
        action = event.action.as_str(),
        "behavior event recorded"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

async fn recommendations(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let snapshot = load_snapshot(&state, &correlation_id).await?;
    let request = RecommendationRequest::new(&user_id)
        .with_limit(query.limit.unwrap_or(state.default_limit));

    let mut rng = StdRng::from_entropy();
    let products = state.recommender.recommend(&snapshot, &request, Utc::now(), &mut rng);

    info!(
        event_name = "api.recommendations.served",
        correlation_id = %correlation_id,
        user_id = %user_id,
        count = products.len(),
        "recommendations served"
    );

    Ok(Json(products))
}

async fn popular_products(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let snapshot = load_snapshot(&state, &correlation_id).await?;
    let mut rng = StdRng::from_entropy();
    let products = state.recommender.popular(&snapshot, &mut rng);

    Ok(Json(products))
}

fn parse_price_bound(
    value: Option<&str>,
    field: &str,
    correlation_id: &str,
) -> Result<Option<Decimal>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => Decimal::from_str(raw.trim()).map(Some).map_err(|_| {
            reject(InterfaceError::BadRequest {
                message: format!("`{field}` must be a decimal number, got `{raw}`"),
                correlation_id: correlation_id.to_string(),
            })
        }),
    }
}

async fn list_products(
    State(state): State<ApiState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let filter = ProductFilter {
        category_id: query.category_id.map(CategoryId),
        search: query.search,
        min_price: parse_price_bound(query.min_price.as_deref(), "minPrice", &correlation_id)?,
        max_price: parse_price_bound(query.max_price.as_deref(), "maxPrice", &correlation_id)?,
    };

    let products = state
        .catalog
        .list_products(&filter)
        .await
        .map_err(|e| storage_unavailable(e, &correlation_id))?;

    Ok(Json(products))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use storefront_core::domain::category::{Category, CategoryId};
    use storefront_core::domain::product::{Product, ProductId};
    use storefront_db::repositories::{
        BehaviorRepository, CatalogRepository, InMemoryBehaviorRepository,
        InMemoryCatalogRepository,
    };

    use super::*;

    fn product(id: &str, category: &str, price: &str) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: format!("Product {id}"),
            description: String::new(),
            price: price.to_string(),
            original_price: None,
            image_url: None,
            category_id: Some(CategoryId(category.to_string())),
            stock: Some(5),
            rating: None,
            review_count: None,
            tags: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    async fn seeded_state() -> ApiState {
        let catalog = InMemoryCatalogRepository::default();
        for (id, name) in [("electronics", "Electronics"), ("books", "Books")] {
            catalog
                .save_category(Category {
                    id: CategoryId(id.to_string()),
                    name: name.to_string(),
                    slug: id.to_string(),
                })
                .await
                .expect("category");
        }
        for (id, category, price) in [
            ("e1", "electronics", "100.00"),
            ("e2", "electronics", "120.00"),
            ("e3", "electronics", "90.00"),
            ("b1", "books", "12.00"),
            ("b2", "books", "15.00"),
            ("b3", "books", "18.00"),
        ] {
            catalog.save_product(product(id, category, price)).await.expect("product");
        }

        ApiState {
            catalog: Arc::new(catalog),
            behavior: Arc::new(InMemoryBehaviorRepository::default()),
            recommender: Recommender::default(),
            default_limit: 6,
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("valid json")
    }

    fn post_behavior(payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/behavior")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn behavior_post_returns_created_with_the_event() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app
            .oneshot(post_behavior(json!({
                "userId": "u-1", "productId": "e1", "action": "purchase"
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["userId"], "u-1");
        assert_eq!(body["action"], "purchase");
        assert!(body["id"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_action_is_a_bad_request() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app
            .oneshot(post_behavior(json!({
                "userId": "u-1", "productId": "e1", "action": "wishlist"
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["correlationId"].is_string());
    }

    #[tokio::test]
    async fn missing_user_id_is_a_bad_request() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app
            .oneshot(post_behavior(json!({ "productId": "e1", "action": "view" })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recommendations_respect_the_limit_and_exclude_history() {
        let state = seeded_state().await;
        state
            .behavior
            .record(BehaviorEventInput::parse("u-1", Some("e1"), "purchase").expect("input"))
            .await
            .expect("record");
        state
            .behavior
            .record(BehaviorEventInput::parse("u-2", Some("e1"), "view").expect("input"))
            .await
            .expect("record");
        state
            .behavior
            .record(BehaviorEventInput::parse("u-2", Some("b1"), "purchase").expect("input"))
            .await
            .expect("record");
        let app = router(state);

        let response =
            app.oneshot(get("/recommendations/u-1?limit=3")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let items = body.as_array().expect("array");
        assert!(items.len() <= 3);
        assert!(items.iter().all(|item| item["id"] != "e1"), "purchased product excluded");
    }

    #[tokio::test]
    async fn cold_start_recommendations_fill_the_default_limit() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app.oneshot(get("/recommendations/someone-new")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().expect("array").len(), 6);
    }

    #[tokio::test]
    async fn popular_ranks_by_weighted_actions() {
        let state = seeded_state().await;
        for _ in 0..2 {
            state
                .behavior
                .record(BehaviorEventInput::parse("u-1", Some("b1"), "view").expect("input"))
                .await
                .expect("record");
        }
        state
            .behavior
            .record(BehaviorEventInput::parse("u-2", Some("e1"), "purchase").expect("input"))
            .await
            .expect("record");
        let app = router(state);

        let response = app.oneshot(get("/products/popular")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let items = body.as_array().expect("array");
        assert_eq!(items[0]["id"], "e1", "one purchase outweighs two views");
        assert_eq!(items[1]["id"], "b1");
    }

    #[tokio::test]
    async fn products_listing_applies_filters() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app
            .oneshot(get("/products?categoryId=books&minPrice=14"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let ids: Vec<&str> =
            body.as_array().expect("array").iter().filter_map(|p| p["id"].as_str()).collect();
        assert_eq!(ids, vec!["b2", "b3"]);
    }

    #[tokio::test]
    async fn invalid_price_bound_is_a_bad_request() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app.oneshot(get("/products?minPrice=cheap")).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
