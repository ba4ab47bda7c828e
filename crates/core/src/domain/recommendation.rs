use super::product::ProductId;
use crate::recs::DEFAULT_LIMIT;

/// Ephemeral, per-request recommendation parameters. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct RecommendationRequest {
    pub user_id: String,
    /// Products currently in the user's cart, when the caller knows them.
    /// These are treated as recent cart signal and excluded from results.
    pub cart_product_ids: Vec<ProductId>,
    pub limit: usize,
}

impl RecommendationRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), cart_product_ids: Vec::new(), limit: DEFAULT_LIMIT }
    }

    pub fn with_cart(mut self, cart_product_ids: Vec<ProductId>) -> Self {
        self.cart_product_ids = cart_product_ids;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}
