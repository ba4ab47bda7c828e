pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with, ConnectionSettings, DbPool};
pub use fixtures::{seed_demo_catalog, SeedResult};
