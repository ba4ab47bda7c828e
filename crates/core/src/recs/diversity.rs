//! Diversity-aware selection over a ranked candidate list.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::category::CategoryId;
use crate::domain::product::{Product, ProductId};

use super::{RankedCandidate, MIN_DISTINCT_CATEGORIES, SOFT_CATEGORY_CAP};

/// Post-processes a ranked candidate list so the final selection spans
/// multiple categories instead of clustering in one.
///
/// Items over a category's soft cap are deferred, not discarded: they are
/// revisited once the diversity target is met and slots remain. If one pass
/// leaves the selection short, absent categories are backfilled with one
/// random eligible product each. A short result is valid output, never an
/// error.
#[derive(Clone, Copy, Debug)]
pub struct DiversitySelector {
    soft_cap: usize,
    min_categories: usize,
}

impl Default for DiversitySelector {
    fn default() -> Self {
        Self { soft_cap: SOFT_CATEGORY_CAP, min_categories: MIN_DISTINCT_CATEGORIES }
    }
}

impl DiversitySelector {
    pub fn new(soft_cap: usize, min_categories: usize) -> Self {
        Self { soft_cap: soft_cap.max(1), min_categories }
    }

    pub fn select<R: Rng>(
        &self,
        ranked: &[RankedCandidate],
        catalog: &[Product],
        exclude: &HashSet<ProductId>,
        target: usize,
        rng: &mut R,
    ) -> Vec<Product> {
        let mut selected: Vec<Product> = Vec::with_capacity(target);
        let mut seen: HashSet<ProductId> = HashSet::new();
        let mut category_counts: HashMap<Option<CategoryId>, usize> = HashMap::new();
        let mut deferred: Vec<&RankedCandidate> = Vec::new();

        for candidate in ranked {
            if selected.len() == target {
                break;
            }
            if exclude.contains(&candidate.product.id) || seen.contains(&candidate.product.id) {
                continue;
            }

            let key = candidate.product.category_id.clone();
            let count = category_counts.entry(key).or_insert(0);
            if *count < self.soft_cap {
                *count += 1;
                seen.insert(candidate.product.id.clone());
                selected.push(candidate.product.clone());
            } else {
                deferred.push(candidate);
            }
        }

        // Deferred items come back only once the diversity target is met.
        let diversity_target = self.min_categories.min(distinct_categories(
            ranked.iter().map(|candidate| &candidate.product),
        ));
        if selected.len() < target
            && distinct_categories(selected.iter()) >= diversity_target
        {
            for candidate in deferred {
                if selected.len() == target {
                    break;
                }
                if seen.insert(candidate.product.id.clone()) {
                    selected.push(candidate.product.clone());
                }
            }
        }

        if selected.len() < target {
            self.backfill(&mut selected, &mut seen, catalog, exclude, target, rng);
        }

        selected
    }

    /// Picks one random eligible product from each category missing from
    /// the selection, until the target is reached or categories run out.
    fn backfill<R: Rng>(
        &self,
        selected: &mut Vec<Product>,
        seen: &mut HashSet<ProductId>,
        catalog: &[Product],
        exclude: &HashSet<ProductId>,
        target: usize,
        rng: &mut R,
    ) {
        let present: HashSet<&CategoryId> =
            selected.iter().filter_map(|product| product.category_id.as_ref()).collect();

        let mut absent: Vec<&CategoryId> = catalog
            .iter()
            .filter(|product| product.is_active)
            .filter_map(|product| product.category_id.as_ref())
            .filter(|category_id| !present.contains(category_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        absent.sort();
        absent.shuffle(rng);

        for category_id in absent {
            if selected.len() == target {
                break;
            }

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
                seen.insert(pick.id.clone());
                selected.push((*pick).clone());
            }
        }
    }
}

fn distinct_categories<'a>(products: impl Iterator<Item = &'a Product>) -> usize {
    products
        .filter_map(|product| product.category_id.as_ref())
        .collect::<HashSet<_>>()
        .len()
}
