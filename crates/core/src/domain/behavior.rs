use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::ProductId;
use crate::errors::DomainError;

/// Tracked interaction kinds, in ascending order of purchase intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorAction {
    View,
    AddToCart,
    Purchase,
}

impl BehaviorAction {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim() {
            "view" => Ok(Self::View),
            "add_to_cart" => Ok(Self::AddToCart),
            "purchase" => Ok(Self::Purchase),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::AddToCart => "add_to_cart",
            Self::Purchase => "purchase",
        }
    }

    /// Collaborative aggregation weight.
    pub fn weight(&self) -> u32 {
        match self {
            Self::View => 1,
            Self::AddToCart => 2,
            Self::Purchase => 3,
        }
    }
}

/// One append-only record of a user interacting with a product.
///
/// `user_id` is opaque and may denote a guest session; nothing here assumes
/// it resolves to a stored account. `product_id` may be absent or dangling
/// and every reader tolerates that.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEvent {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: Option<ProductId>,
    pub action: BehaviorAction,
    pub timestamp: DateTime<Utc>,
}

/// Validated input for recording a new behavior event. The timestamp is
/// assigned by the store at write time, never taken from the client.
#[derive(Clone, Debug, PartialEq)]
pub struct BehaviorEventInput {
    pub user_id: String,
    pub product_id: Option<ProductId>,
    pub action: BehaviorAction,
}

impl BehaviorEventInput {
    pub fn parse(
        user_id: &str,
        product_id: Option<&str>,
        action: &str,
    ) -> Result<Self, DomainError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(DomainError::MissingUserId);
        }

        Ok(Self {
            user_id: user_id.to_string(),
            product_id: product_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| ProductId(id.to_string())),
            action: BehaviorAction::parse(action)?,
        })
    }
}
