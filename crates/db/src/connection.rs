use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use storefront_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Pool tuning derived from `[database]` config. Tests build these directly
/// so they can connect without assembling a full `AppConfig`.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout_ms: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout_ms: 5_000,
        }
    }
}

impl ConnectionSettings {
    /// Single-connection pool for in-memory test databases.
    pub fn for_tests() -> Self {
        Self {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }
}

impl From<&DatabaseConfig> for ConnectionSettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.timeout_secs),
            busy_timeout_ms: config.busy_timeout_ms,
        }
    }
}

pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with(&config.url, ConnectionSettings::from(config)).await
}

pub async fn connect_with(
    database_url: &str,
    settings: ConnectionSettings,
) -> Result<DbPool, sqlx::Error> {
    let busy_timeout_ms = settings.busy_timeout_ms;
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(settings.acquire_timeout.max(Duration::from_secs(1)))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query(&format!("PRAGMA busy_timeout = {busy_timeout_ms}"))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
