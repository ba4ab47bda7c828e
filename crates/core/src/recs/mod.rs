//! Behavior-driven recommendation engine.
//!
//! Scores and ranks catalog products for a user from behavioral signals
//! (views, cart-adds, purchases) and returns a category-diversified
//! candidate set. Every entry point is a pure function of a read-once
//! snapshot of the behavior log and catalog; randomness is injected so
//! tests stay deterministic.

mod diversity;
mod engine;
mod ranking;
mod similarity;

pub use diversity::DiversitySelector;
pub use engine::{Recommender, Snapshot};
pub use ranking::{rank_collaborative, rank_content_based, ContentScore, RankedCandidate};
pub use similarity::{find_neighbors, jaccard, Neighbor};

/// Default result size per request.
pub const DEFAULT_LIMIT: usize = 6;

/// Add-to-cart events younger than this count as recent cart activity.
pub const RECENT_CART_WINDOW_HOURS: i64 = 24;

/// Slots reserved for out-of-category picks under the cart-based strategy.
pub const CART_DIVERSE_SLOTS: usize = 2;

/// Soft per-category cap applied by the diversity selector.
pub const SOFT_CATEGORY_CAP: usize = 2;

/// Minimum distinct categories the final selection should span, bounded by
/// how many categories exist at all.
pub const MIN_DISTINCT_CATEGORIES: usize = 3;

/// Upper bound on evictions when rebalancing an over-concentrated
/// collaborative selection.
pub const MAX_CATEGORY_REPLACEMENTS: usize = 2;

/// Default cap on the neighbor set considered by collaborative ranking.
pub const DEFAULT_MAX_NEIGHBORS: usize = 50;

/// Cold-start picks per category before the final shuffle.
pub const COLD_START_PER_CATEGORY: usize = 2;

/// Size of the popularity listing.
pub const POPULAR_LIMIT: usize = 10;
