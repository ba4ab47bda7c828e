use thiserror::Error;
use tracing::info;

use storefront_core::config::{AppConfig, LoadOptions};
use storefront_core::domain::product::ProductFilter;
use storefront_core::errors::ApplicationError;
use storefront_db::repositories::{CatalogRepository, RepositoryError, SqlCatalogRepository};
use storefront_db::{connect, migrations, seed_demo_catalog, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ApplicationError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("catalog seeding failed: {0}")]
    Seed(#[source] RepositoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options).map_err(ApplicationError::from)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    seed_if_empty(&db_pool).await?;

    Ok(Application { config, db_pool })
}

/// Loads the demo catalog on first start. An already populated catalog is
/// left untouched.
async fn seed_if_empty(db_pool: &DbPool) -> Result<(), BootstrapError> {
    let catalog = SqlCatalogRepository::new(db_pool.clone());
    let existing = catalog
        .list_products(&ProductFilter::default())
        .await
        .map_err(BootstrapError::Seed)?;
    if !existing.is_empty() {
        return Ok(());
    }

    let result = seed_demo_catalog(&catalog).await.map_err(BootstrapError::Seed)?;
    info!(
        event_name = "system.bootstrap.catalog_seeded",
        correlation_id = "bootstrap",
        categories = result.categories,
        products = result.products,
        "demo catalog seeded"
    );
    Ok(())
}
