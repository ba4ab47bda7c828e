use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use storefront_core::domain::behavior::{BehaviorAction, BehaviorEvent, BehaviorEventInput};
use storefront_core::domain::product::ProductId;

use super::{BehaviorRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBehaviorRepository {
    pool: DbPool,
}

impl SqlBehaviorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<BehaviorEvent, RepositoryError> {
    let id_str: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: Option<String> =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_str: String =
        row.try_get("action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let timestamp_str: String =
        row.try_get("timestamp").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| RepositoryError::Decode(format!("event id {id_str}: {e}")))?;
    let action = BehaviorAction::parse(&action_str)
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(BehaviorEvent {
        id,
        user_id,
        product_id: product_id.map(ProductId),
        action,
        timestamp,
    })
}

#[async_trait::async_trait]
impl BehaviorRepository for SqlBehaviorRepository {
    async fn record(&self, input: BehaviorEventInput) -> Result<BehaviorEvent, RepositoryError> {
        let event = BehaviorEvent {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            product_id: input.product_id,
            action: input.action,
            timestamp: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO behavior_events (id, user_id, product_id, action, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.id.to_string())
        .bind(&event.user_id)
        .bind(event.product_id.as_ref().map(|p| p.0.as_str()))
        .bind(event.action.as_str())
        .bind(event.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    async fn list_all(&self) -> Result<Vec<BehaviorEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, product_id, action, timestamp
             FROM behavior_events ORDER BY timestamp ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<BehaviorEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, product_id, action, timestamp
             FROM behavior_events WHERE user_id = ? ORDER BY timestamp ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }
}
