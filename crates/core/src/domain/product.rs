use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::CategoryId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Canonical product shape consumed by the recommendation core.
///
/// `price` and `rating` are kept as decimal strings, matching the stored
/// record; consumers parse them on demand and treat unparseable values as
/// absent rather than failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub original_price: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub stock: Option<i64>,
    pub rating: Option<String>,
    pub review_count: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn parsed_price(&self) -> Option<f64> {
        parse_decimal(&self.price)
    }

    pub fn parsed_rating(&self) -> Option<f64> {
        self.rating.as_deref().and_then(parse_decimal)
    }

    pub fn tag_slice(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

fn parse_decimal(value: &str) -> Option<f64> {
    Decimal::from_str(value.trim()).ok().and_then(|decimal| decimal.to_f64())
}

/// Catalog listing filter. All fields are conjunctive; `search` matches
/// name, description, or any tag, case-insensitively.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.search.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}
