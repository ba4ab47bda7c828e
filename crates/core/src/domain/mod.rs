pub mod behavior;
pub mod category;
pub mod product;
pub mod recommendation;
