//! Recommendation orchestrator: per-request strategy selection over a
//! read-once snapshot of the behavior log and catalog.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::RecommenderConfig;
use crate::domain::behavior::{BehaviorAction, BehaviorEvent};
use crate::domain::category::CategoryId;
use crate::domain::product::{Product, ProductId};
use crate::domain::recommendation::RecommendationRequest;

use super::diversity::DiversitySelector;
use super::ranking::{rank_collaborative, rank_content_based, RankedCandidate};
use super::similarity::find_neighbors;
use super::{
    CART_DIVERSE_SLOTS, COLD_START_PER_CATEGORY, DEFAULT_MAX_NEIGHBORS,
    MAX_CATEGORY_REPLACEMENTS, MIN_DISTINCT_CATEGORIES, POPULAR_LIMIT,
    RECENT_CART_WINDOW_HOURS, SOFT_CATEGORY_CAP,
};

/// Stale-but-consistent copies of the behavior log and catalog, read once
/// per request. The engine never mutates them and holds no state across
/// requests, so concurrent requests need no coordination.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub events: Vec<BehaviorEvent>,
    pub catalog: Vec<Product>,
}

/// Strategy-selecting entry point for recommendations.
///
/// Each request is independently re-evaluated through a linear strategy
/// chain: recent cart activity wins, then cold start for users with no
/// history, then collaborative filtering, with random padding as the last
/// resort in every branch.
#[derive(Clone, Copy, Debug)]
pub struct Recommender {
    max_neighbors: usize,
    recent_cart_window_hours: i64,
    selector: DiversitySelector,
}

impl Default for Recommender {
    fn default() -> Self {
        Self {
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            recent_cart_window_hours: RECENT_CART_WINDOW_HOURS,
            selector: DiversitySelector::default(),
        }
    }
}

impl Recommender {
    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self {
            max_neighbors: config.max_neighbors,
            recent_cart_window_hours: config.recent_cart_window_hours,
            selector: DiversitySelector::default(),
        }
    }

    pub fn recommend<R: Rng>(
        &self,
        snapshot: &Snapshot,
        request: &RecommendationRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Product> {
        let limit = request.limit.max(1);

        let user_events: Vec<&BehaviorEvent> = snapshot
            .events
            .iter()
            .filter(|event| event.user_id == request.user_id)
            .collect();

        let interacted: HashSet<ProductId> = user_events
            .iter()
            .filter_map(|event| event.product_id.clone())
            .collect();

        let cart_set = self.cart_set(&user_events, request, now);

        let mut selected = if !cart_set.is_empty() {
            self.cart_based(snapshot, &interacted, &cart_set, limit, rng)
        } else if user_events.is_empty() {
            self.cold_start(snapshot, limit, rng)
        } else {
            self.collaborative(snapshot, &request.user_id, &interacted, limit, rng)
        };

        let mut exclude = interacted;
        exclude.extend(cart_set);
        pad_random(&mut selected, &snapshot.catalog, &exclude, limit, rng);

        selected.truncate(limit);
        selected
    }

    /// Weighted-action popularity across all users. Falls back to a random
    /// active sample when the behavior log is empty.
    pub fn popular<R: Rng>(&self, snapshot: &Snapshot, rng: &mut R) -> Vec<Product> {
        let mut weights: HashMap<&ProductId, u32> = HashMap::new();
        for event in &snapshot.events {
            if let Some(product_id) = &event.product_id {
                *weights.entry(product_id).or_default() += event.action.weight();
            }
        }

        let mut ranked: Vec<RankedCandidate> = snapshot
            .catalog
            .iter()
            .filter(|product| product.is_active)
            .filter_map(|product| {
                weights.get(&product.id).map(|weight| RankedCandidate {
                    product: product.clone(),
                    score: f64::from(*weight),
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(POPULAR_LIMIT);

        if ranked.is_empty() {
            let mut sample: Vec<Product> = snapshot
                .catalog
                .iter()
                .filter(|product| product.is_active)
                .cloned()
                .collect();
            sample.shuffle(rng);
            sample.truncate(POPULAR_LIMIT);
            return sample;
        }

        ranked.into_iter().map(|candidate| candidate.product).collect()
    }

    /// Cart products from the request plus add-to-cart events inside the
    /// recency window, resolved against event timestamps at serve time.
    fn cart_set(
        &self,
        user_events: &[&BehaviorEvent],
        request: &RecommendationRequest,
        now: DateTime<Utc>,
    ) -> HashSet<ProductId> {
        let window_start = now - Duration::hours(self.recent_cart_window_hours);

        let mut cart: HashSet<ProductId> =
            request.cart_product_ids.iter().cloned().collect();
        cart.extend(
            user_events
                .iter()
                .filter(|event| {
                    event.action == BehaviorAction::AddToCart && event.timestamp > window_start
                })
                .filter_map(|event| event.product_id.clone()),
        );
        cart
    }

    /// Recent-cart strategy: most slots go to ranked same-category picks,
    /// the rest to a shuffled pool from other categories. Composition is
    /// mixed by construction, so no diversity pass runs afterwards.
    fn cart_based<R: Rng>(
        &self,
        snapshot: &Snapshot,
        interacted: &HashSet<ProductId>,
        cart_set: &HashSet<ProductId>,
        limit: usize,
        rng: &mut R,
    ) -> Vec<Product> {
        let recent_categories: HashSet<&CategoryId> = snapshot
            .catalog
            .iter()
            .filter(|product| cart_set.contains(&product.id))
            .filter_map(|product| product.category_id.as_ref())
            .collect();

        let mut exclude = interacted.clone();
        exclude.extend(cart_set.iter().cloned());

        let history: Vec<&Product> = snapshot
            .catalog
            .iter()
            .filter(|product| interacted.contains(&product.id))
            .collect();

        let same_category_slots = limit.saturating_sub(CART_DIVERSE_SLOTS).max(1);
        let mut selected: Vec<Product> =
            rank_content_based(&snapshot.catalog, &history, &exclude)
                .into_iter()
                .filter(|candidate| {
                    candidate
                        .product
                        .category_id
                        .as_ref()
                        .is_some_and(|category_id| recent_categories.contains(category_id))
                })
                .take(same_category_slots)
                .map(|candidate| candidate.product)
                .collect();

        let seen: HashSet<ProductId> =
            selected.iter().map(|product| product.id.clone()).collect();
        let mut diverse_pool: Vec<&Product> = snapshot
            .catalog
            .iter()
            .filter(|product| {
                product.is_active
                    && !exclude.contains(&product.id)
                    && !seen.contains(&product.id)
                    && !product
                        .category_id
                        .as_ref()
                        .is_some_and(|category_id| recent_categories.contains(category_id))
            })
            .collect();
        diverse_pool.shuffle(rng);
        selected.extend(diverse_pool.into_iter().take(CART_DIVERSE_SLOTS).cloned());

        selected
    }

    /// Cold start: up to two random active products per category, shuffled.
    fn cold_start<R: Rng>(&self, snapshot: &Snapshot, limit: usize, rng: &mut R) -> Vec<Product> {
        let mut per_category: HashMap<&CategoryId, Vec<&Product>> = HashMap::new();
        for product in snapshot.catalog.iter().filter(|product| product.is_active) {
            if let Some(category_id) = &product.category_id {
                per_category.entry(category_id).or_default().push(product);
            }
        }

        let mut categories: Vec<&CategoryId> = per_category.keys().copied().collect();
        categories.sort();

        let mut picks: Vec<Product> = Vec::new();
        for category_id in categories {
            if let Some(pool) = per_category.get_mut(category_id) {
                pool.shuffle(rng);
                picks.extend(pool.iter().take(COLD_START_PER_CATEGORY).map(|p| (*p).clone()));
            }
        }

        picks.shuffle(rng);
        picks.truncate(limit);
        picks
    }

    /// Collaborative strategy: neighbor-weighted ranking, diversity
    /// selection, then category rebalancing when the selection is too
    /// concentrated.
    fn collaborative<R: Rng>(
        &self,
        snapshot: &Snapshot,
        user_id: &str,
        interacted: &HashSet<ProductId>,
        limit: usize,
        rng: &mut R,
    ) -> Vec<Product> {
        let neighbors =
            find_neighbors(&snapshot.events, user_id, interacted, self.max_neighbors);
        let ranked =
            rank_collaborative(&snapshot.catalog, &snapshot.events, &neighbors, interacted);

        let mut selected =
            self.selector.select(&ranked, &snapshot.catalog, interacted, limit, rng);
        self.rebalance(&mut selected, &snapshot.catalog, interacted, rng);
        selected
    }

    /// When the selection spans fewer distinct categories than the target,
    /// evicts the lowest-ranked entries of over-represented categories (at
    /// most two) and backfills from categories absent in the selection.
    fn rebalance<R: Rng>(
        &self,
        selected: &mut Vec<Product>,
        catalog: &[Product],
        exclude: &HashSet<ProductId>,
        rng: &mut R,
    ) {
        if selected.is_empty() {
            return;
        }

        let catalog_categories: HashSet<&CategoryId> = catalog
            .iter()
            .filter(|product| product.is_active)
            .filter_map(|product| product.category_id.as_ref())
            .collect();
        let target = MIN_DISTINCT_CATEGORIES.min(catalog_categories.len());

        let selected_categories: HashSet<CategoryId> = selected
            .iter()
            .filter_map(|product| product.category_id.clone())
            .collect();
        if selected_categories.len() >= target {
            return;
        }

        let mut counts: HashMap<Option<CategoryId>, usize> = HashMap::new();
        for product in selected.iter() {
            *counts.entry(product.category_id.clone()).or_default() += 1;
        }

        let mut absent: Vec<&CategoryId> = catalog_categories
            .into_iter()
            .filter(|category_id| !selected_categories.contains(category_id))
            .collect();
        absent.sort();
        absent.shuffle(rng);

        let mut replacements = 0;
        for category_id in absent {
            if replacements == MAX_CATEGORY_REPLACEMENTS {
                break;
            }

            let Some(victim_index) = selected.iter().rposition(|product| {
                counts.get(&product.category_id).copied().unwrap_or(0) > SOFT_CATEGORY_CAP
            }) else {
                break;
            };

            let seen: HashSet<&ProductId> = selected.iter().map(|product| &product.id).collect();
            let pool: Vec<&Product> = catalog
                .iter()
                .filter(|product| {
                    product.is_active
                        && product.category_id.as_ref() == Some(category_id)
                        && !exclude.contains(&product.id)
                        && !seen.contains(&product.id)
                })
                .collect();

            if let Some(pick) = pool.choose(rng) {
                let victim = selected.remove(victim_index);
                if let Some(count) = counts.get_mut(&victim.category_id) {
                    *count -= 1;
                }
                *counts.entry(pick.category_id.clone()).or_default() += 1;
                selected.push((*pick).clone());
                replacements += 1;
            }
        }
    }
}

/// Pads a selection with random still-eligible active products until the
/// limit is reached or candidates are exhausted.
fn pad_random<R: Rng>(
    selected: &mut Vec<Product>,
    catalog: &[Product],
    exclude: &HashSet<ProductId>,
    limit: usize,
    rng: &mut R,
) {
    if selected.len() >= limit {
        return;
    }

    let seen: HashSet<&ProductId> = selected.iter().map(|product| &product.id).collect();
    let mut pool: Vec<&Product> = catalog
        .iter()
        .filter(|product| {
            product.is_active && !exclude.contains(&product.id) && !seen.contains(&product.id)
        })
        .collect();
    pool.shuffle(rng);

    let missing = limit - selected.len();
    selected.extend(pool.into_iter().take(missing).cloned());
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

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

    fn event_at(
        user: &str,
        product: &str,
        action: BehaviorAction,
        timestamp: DateTime<Utc>,
    ) -> BehaviorEvent {
        BehaviorEvent {
            id: Uuid::new_v4(),
            user_id: user.to_string(),
            product_id: Some(ProductId(product.to_string())),
            action,
            timestamp,
        }
    }

    fn category_count(products: &[Product], category: &str) -> usize {
        products
            .iter()
            .filter(|p| p.category_id.as_ref().map(|c| c.0.as_str()) == Some(category))
            .count()
    }

    fn distinct_categories(products: &[Product]) -> usize {
        products
            .iter()
            .filter_map(|p| p.category_id.as_ref())
            .collect::<HashSet<_>>()
            .len()
    }

    #[test]
    fn cold_start_spans_available_categories() {
        // Empty log, 5 products across 3 categories (2, 2, 1).
        let snapshot = Snapshot {
            events: Vec::new(),
            catalog: vec![
                product("e1", "electronics", "10.00"),
                product("e2", "electronics", "20.00"),
                product("b1", "books", "8.00"),
                product("b2", "books", "9.00"),
                product("s1", "sports", "30.00"),
            ],
        };
        let request = RecommendationRequest::new("fresh-user");
        let mut rng = StdRng::seed_from_u64(11);

        let result =
            Recommender::default().recommend(&snapshot, &request, Utc::now(), &mut rng);

        assert_eq!(result.len(), 5);
        assert_eq!(distinct_categories(&result), 3);
        assert!(category_count(&result, "electronics") <= 2);
        assert!(category_count(&result, "books") <= 2);
    }

    #[test]
    fn recent_cart_adds_prioritize_matching_categories() {
        // U carted an electronics product an hour ago; catalog offers 3
        // more electronics and 4 books.
        let now = Utc::now();
        let snapshot = Snapshot {
            events: vec![event_at(
                "u",
                "e0",
                BehaviorAction::AddToCart,
                now - Duration::hours(1),
            )],
            catalog: vec![
                product("e0", "electronics", "100.00"),
                product("e1", "electronics", "110.00"),
                product("e2", "electronics", "90.00"),
                product("e3", "electronics", "120.00"),
                product("b1", "books", "10.00"),
                product("b2", "books", "12.00"),
                product("b3", "books", "9.00"),
                product("b4", "books", "11.00"),
            ],
        };
        let request = RecommendationRequest::new("u");
        let mut rng = StdRng::seed_from_u64(3);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        assert_eq!(result.len(), 6);
        assert!(result.iter().all(|p| p.id.0 != "e0"), "carted product must be excluded");
        assert!(category_count(&result, "electronics") <= 4);
        assert!(category_count(&result, "books") >= 2);
    }

    #[test]
    fn stale_cart_adds_do_not_trigger_the_cart_strategy() {
        let now = Utc::now();
        let snapshot = Snapshot {
            events: vec![
                event_at("u", "e0", BehaviorAction::AddToCart, now - Duration::hours(30)),
                event_at("v", "e0", BehaviorAction::Purchase, now - Duration::hours(2)),
                event_at("v", "b1", BehaviorAction::Purchase, now - Duration::hours(2)),
            ],
            catalog: vec![
                product("e0", "electronics", "100.00"),
                product("e1", "electronics", "110.00"),
                product("b1", "books", "10.00"),
            ],
        };
        let request = RecommendationRequest::new("u").with_limit(2);
        let mut rng = StdRng::seed_from_u64(5);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        // Collaborative path: V's purchase of b1 is the strongest signal.
        assert!(result.iter().any(|p| p.id.0 == "b1"));
        assert!(result.iter().all(|p| p.id.0 != "e0"));
    }

    #[test]
    fn collaborative_surfaces_neighbor_purchases_first() {
        // U purchased P1. V purchased P1 and P2, and only viewed P3.
        let now = Utc::now();
        let old = now - Duration::days(3);
        let snapshot = Snapshot {
            events: vec![
                event_at("u", "p1", BehaviorAction::Purchase, old),
                event_at("v", "p1", BehaviorAction::Purchase, old),
                event_at("v", "p2", BehaviorAction::Purchase, old),
                event_at("v", "p3", BehaviorAction::View, old),
            ],
            catalog: vec![
                product("p1", "books", "10.00"),
                product("p2", "electronics", "50.00"),
                product("p3", "electronics", "60.00"),
            ],
        };
        let request = RecommendationRequest::new("u").with_limit(1);
        let mut rng = StdRng::seed_from_u64(9);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.0, "p2", "purchase weight 3 should outrank view weight 1");
    }

    #[test]
    fn purchased_products_never_come_back() {
        let now = Utc::now();
        let old = now - Duration::days(2);
        let snapshot = Snapshot {
            events: vec![
                event_at("u", "p1", BehaviorAction::Purchase, old),
                event_at("v", "p1", BehaviorAction::View, old),
                event_at("v", "p2", BehaviorAction::View, old),
            ],
            catalog: vec![
                product("p1", "books", "10.00"),
                product("p2", "books", "11.00"),
                product("p3", "sports", "20.00"),
            ],
        };
        let request = RecommendationRequest::new("u");
        let mut rng = StdRng::seed_from_u64(13);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        assert!(result.iter().all(|p| p.id.0 != "p1"));
    }

    #[test]
    fn results_have_no_duplicates_and_only_active_products() {
        let now = Utc::now();
        let mut catalog: Vec<Product> = (0..20)
            .map(|i| {
                product(
                    &format!("p{i}"),
                    ["electronics", "books", "sports", "home"][i % 4],
                    "25.00",
                )
            })
            .collect();
        catalog[7].is_active = false;
        catalog[13].is_active = false;

        let events = vec![
            event_at("u", "p0", BehaviorAction::View, now - Duration::days(1)),
            event_at("w", "p0", BehaviorAction::Purchase, now - Duration::days(1)),
            event_at("w", "p7", BehaviorAction::Purchase, now - Duration::days(1)),
            event_at("w", "p5", BehaviorAction::AddToCart, now - Duration::days(1)),
        ];
        let snapshot = Snapshot { events, catalog };
        let request = RecommendationRequest::new("u");
        let mut rng = StdRng::seed_from_u64(21);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        assert_eq!(result.len(), 6);
        let ids: HashSet<&str> = result.iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids.len(), result.len(), "no duplicate product ids");
        assert!(result.iter().all(|p| p.is_active), "inactive products never appear");
    }

    #[test]
    fn sparse_candidates_pad_up_to_the_limit() {
        let now = Utc::now();
        let snapshot = Snapshot {
            events: vec![
                event_at("u", "p1", BehaviorAction::View, now - Duration::days(5)),
                event_at("v", "p1", BehaviorAction::View, now - Duration::days(5)),
                event_at("v", "p2", BehaviorAction::View, now - Duration::days(5)),
            ],
            catalog: (0..10)
                .map(|i| product(&format!("p{i}"), ["a", "b", "c"][i % 3], "10.00"))
                .collect(),
        };
        let request = RecommendationRequest::new("u");
        let mut rng = StdRng::seed_from_u64(17);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        // One collaborative candidate (p2); the rest comes from padding.
        assert_eq!(result.len(), 6);
        assert!(result.iter().all(|p| p.id.0 != "p1"));
    }

    #[test]
    fn short_catalog_yields_short_result_not_an_error() {
        let snapshot = Snapshot {
            events: Vec::new(),
            catalog: vec![product("p1", "books", "10.00")],
        };
        let request = RecommendationRequest::new("anyone");
        let mut rng = StdRng::seed_from_u64(19);

        let result =
            Recommender::default().recommend(&snapshot, &request, Utc::now(), &mut rng);

        assert_eq!(result.len(), 1);
    }

    #[test]
    fn explicit_cart_ids_activate_the_cart_strategy() {
        let now = Utc::now();
        let snapshot = Snapshot {
            events: Vec::new(),
            catalog: vec![
                product("e0", "electronics", "100.00"),
                product("e1", "electronics", "110.00"),
                product("b1", "books", "10.00"),
            ],
        };
        let request = RecommendationRequest::new("guest-42")
            .with_cart(vec![ProductId("e0".to_string())])
            .with_limit(3);
        let mut rng = StdRng::seed_from_u64(23);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        assert!(result.iter().all(|p| p.id.0 != "e0"), "cart contents are excluded");
        assert!(result.iter().any(|p| p.id.0 == "e1"), "same-category pick comes first");
    }

    #[test]
    fn popular_ranks_by_weighted_actions() {
        let now = Utc::now();
        let snapshot = Snapshot {
            events: vec![
                event_at("a", "p1", BehaviorAction::View, now),
                event_at("b", "p1", BehaviorAction::View, now),
                event_at("a", "p2", BehaviorAction::Purchase, now),
            ],
            catalog: vec![product("p1", "books", "10.00"), product("p2", "books", "12.00")],
        };
        let mut rng = StdRng::seed_from_u64(29);

        let result = Recommender::default().popular(&snapshot, &mut rng);

        assert_eq!(result[0].id.0, "p2", "one purchase (3) outweighs two views (2)");
        assert_eq!(result[1].id.0, "p1");
    }

    #[test]
    fn popular_falls_back_to_a_random_active_sample() {
        let snapshot = Snapshot {
            events: Vec::new(),
            catalog: (0..15)
                .map(|i| product(&format!("p{i}"), "books", "10.00"))
                .collect(),
        };
        let mut rng = StdRng::seed_from_u64(31);

        let result = Recommender::default().popular(&snapshot, &mut rng);

        assert_eq!(result.len(), POPULAR_LIMIT);
        let ids: HashSet<&str> = result.iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids.len(), POPULAR_LIMIT);
    }

    #[test]
    fn rebalance_swaps_in_absent_categories() {
        // Six books dominate the ranked list while other categories exist.
        let now = Utc::now();
        let mut events = Vec::new();
        for i in 0..6 {
            events.push(event_at(
                "v",
                &format!("b{i}"),
                BehaviorAction::Purchase,
                now - Duration::days(1),
            ));
        }
        events.push(event_at("v", "shared", BehaviorAction::View, now - Duration::days(1)));
        events.push(event_at("u", "shared", BehaviorAction::View, now - Duration::days(1)));

        let mut catalog: Vec<Product> =
            (0..6).map(|i| product(&format!("b{i}"), "books", "10.00")).collect();
        catalog.push(product("shared", "books", "10.00"));
        catalog.push(product("s1", "sports", "20.00"));
        catalog.push(product("h1", "home", "30.00"));

        let snapshot = Snapshot { events, catalog };
        let request = RecommendationRequest::new("u");
        let mut rng = StdRng::seed_from_u64(37);

        let result = Recommender::default().recommend(&snapshot, &request, now, &mut rng);

        assert_eq!(result.len(), 6);
        assert!(
            distinct_categories(&result) >= 3,
            "rebalancing should pull in sports and home"
        );
    }
}
