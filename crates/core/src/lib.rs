pub mod config;
pub mod domain;
pub mod errors;
pub mod recs;

pub use config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, RecommenderConfig};
pub use domain::behavior::{BehaviorAction, BehaviorEvent, BehaviorEventInput};
pub use domain::category::{Category, CategoryId};
pub use domain::product::{Product, ProductFilter, ProductId};
pub use domain::recommendation::RecommendationRequest;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recs::{Recommender, Snapshot, DEFAULT_LIMIT, POPULAR_LIMIT};
