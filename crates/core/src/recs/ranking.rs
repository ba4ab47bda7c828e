//! Candidate ranking: content-based component scores against one user's
//! history, and collaborative aggregation of neighbor actions.

use std::collections::{HashMap, HashSet};

use crate::domain::behavior::BehaviorEvent;
use crate::domain::product::{Product, ProductId};

use super::Neighbor;

/// A candidate product with its accumulated score. Candidates hold
/// defensive copies so scoring never aliases the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedCandidate {
    pub product: Product,
    pub score: f64,
}

/// Per-component breakdown of a content-based score. Every component is a
/// total function of its inputs: missing or unparseable data contributes
/// zero instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContentScore {
    pub category: f64,
    pub tags: f64,
    pub price: f64,
    pub rating: f64,
}

impl ContentScore {
    pub fn total(&self) -> f64 {
        self.category + self.tags + self.price + self.rating
    }
}

/// Scores one candidate against the user's history products.
pub fn content_score(candidate: &Product, history: &[&Product]) -> ContentScore {
    let category = match &candidate.category_id {
        Some(category_id) => {
            let matching = history
                .iter()
                .filter(|item| item.category_id.as_ref() == Some(category_id))
                .count();
            2.0 * matching as f64
        }
        None => 0.0,
    };

    let history_tags: HashSet<&str> = history
        .iter()
        .flat_map(|item| item.tag_slice().iter().map(String::as_str))
        .collect();
    let tags =
        candidate.tag_slice().iter().filter(|tag| history_tags.contains(tag.as_str())).count()
            as f64;

    let price = match (average_history_price(history), candidate.parsed_price()) {
        (Some(avg), Some(candidate_price)) if avg > 0.0 => {
            (1.0 - (avg - candidate_price).abs() / avg).max(0.0)
        }
        _ => 0.0,
    };

    let rating = candidate.parsed_rating().unwrap_or(0.0) * 0.5;

    ContentScore { category, tags, price, rating }
}

fn average_history_price(history: &[&Product]) -> Option<f64> {
    let prices: Vec<f64> = history.iter().filter_map(|item| item.parsed_price()).collect();
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

/// Ranks active catalog products against the user's history, excluding any
/// product in `exclude`. The sort is stable, so ties keep catalog order.
pub fn rank_content_based(
    catalog: &[Product],
    history: &[&Product],
    exclude: &HashSet<ProductId>,
) -> Vec<RankedCandidate> {
    let mut candidates: Vec<RankedCandidate> = catalog
        .iter()
        .filter(|product| product.is_active && !exclude.contains(&product.id))
        .map(|product| RankedCandidate {
            score: content_score(product, history).total(),
            product: product.clone(),
        })
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}

/// Ranks candidates by the weighted actions of the target user's neighbors:
/// purchase 3, add-to-cart 2, view 1, summed per product. Products the
/// target already interacted with are excluded.
pub fn rank_collaborative(
    catalog: &[Product],
    events: &[BehaviorEvent],
    neighbors: &[Neighbor],
    exclude: &HashSet<ProductId>,
) -> Vec<RankedCandidate> {
    if neighbors.is_empty() {
        return Vec::new();
    }

    let neighbor_ids: HashSet<&str> =
        neighbors.iter().map(|neighbor| neighbor.user_id.as_str()).collect();

    let mut weights: HashMap<&ProductId, u32> = HashMap::new();
    for event in events {
        if !neighbor_ids.contains(event.user_id.as_str()) {
            continue;
        }
        let Some(product_id) = &event.product_id else { continue };
        if exclude.contains(product_id) {
            continue;
        }
        *weights.entry(product_id).or_default() += event.action.weight();
    }

    let mut candidates: Vec<RankedCandidate> = catalog
        .iter()
        .filter(|product| product.is_active)
        .filter_map(|product| {
            weights.get(&product.id).map(|weight| RankedCandidate {
                product: product.clone(),
                score: f64::from(*weight),
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}
