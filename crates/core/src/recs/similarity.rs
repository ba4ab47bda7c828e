//! Jaccard similarity over interacted-product sets and neighbor discovery.

use std::collections::{HashMap, HashSet};

use crate::domain::behavior::BehaviorEvent;
use crate::domain::product::ProductId;

/// Jaccard index of two interacted-product sets, in [0, 1].
///
/// Two empty sets score 0.0 rather than NaN so downstream ranking stays
/// stable on users with no history.
pub fn jaccard(a: &HashSet<ProductId>, b: &HashSet<ProductId>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

/// Another user with nonzero similarity to the target.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub user_id: String,
    pub similarity: f64,
}

/// Collects every other user sharing at least one interacted product with
/// the target set, ordered by similarity descending and capped at
/// `max_neighbors`. The cap bounds the O(users x events) similarity pass.
pub fn find_neighbors(
    events: &[BehaviorEvent],
    target_user: &str,
    target_set: &HashSet<ProductId>,
    max_neighbors: usize,
) -> Vec<Neighbor> {
    if target_set.is_empty() || max_neighbors == 0 {
        return Vec::new();
    }

    let mut per_user: HashMap<&str, HashSet<ProductId>> = HashMap::new();
    for event in events {
        if event.user_id == target_user {
            continue;
        }
        if let Some(product_id) = &event.product_id {
            per_user.entry(event.user_id.as_str()).or_default().insert(product_id.clone());
        }
    }

    let mut neighbors: Vec<Neighbor> = per_user
        .into_iter()
        .filter_map(|(user_id, interacted)| {
            let similarity = jaccard(target_set, &interacted);
            (similarity > 0.0)
                .then(|| Neighbor { user_id: user_id.to_string(), similarity })
        })
        .collect();

    // Deterministic ordering: similarity first, then user id for ties.
    neighbors.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    neighbors.truncate(max_neighbors);
    neighbors
}
