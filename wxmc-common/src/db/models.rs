//! Per-user transition model persistence
//!
//! The store is the single source of truth for user models; nothing caches
//! them in process-wide state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dataset::DatasetSummary;
use crate::markov::TransitionModel;
use crate::Result;

/// The persisted document behind a user's active model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub model: TransitionModel,
    pub summary: DatasetSummary,
    pub updated_at: DateTime<Utc>,
}

impl ModelRecord {
    pub fn new(model: TransitionModel, summary: DatasetSummary) -> Self {
        Self {
            model,
            summary,
            updated_at: Utc::now(),
        }
    }
}

/// Storage for one model record per user
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Insert or replace the user's record
    async fn save(&self, user_id: Uuid, record: &ModelRecord) -> Result<()>;

    /// The user's record, if one was uploaded
    async fn load(&self, user_id: Uuid) -> Result<Option<ModelRecord>>;

    /// Remove the user's record; returns whether one existed
    async fn delete(&self, user_id: Uuid) -> Result<bool>;
}

/// SQLite-backed store using the `transition_models` table
#[derive(Clone)]
pub struct SqliteModelStore {
    db: SqlitePool,
}

impl SqliteModelStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ModelStore for SqliteModelStore {
    async fn save(&self, user_id: Uuid, record: &ModelRecord) -> Result<()> {
        let categories = serde_json::to_string(record.model.categories())?;
        let matrix = serde_json::to_string(record.model.matrix())?;
        let summary = serde_json::to_string(&record.summary)?;

        // Single upsert: readers see either the old row or the new one
        sqlx::query(
            r#"
            INSERT INTO transition_models (user_guid, categories, matrix, summary, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_guid) DO UPDATE SET
                categories = excluded.categories,
                matrix = excluded.matrix,
                summary = excluded.summary,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.to_string())
        .bind(categories)
        .bind(matrix)
        .bind(summary)
        .bind(record.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn load(&self, user_id: Uuid) -> Result<Option<ModelRecord>> {
        let row: Option<(String, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT categories, matrix, summary, updated_at FROM transition_models WHERE user_guid = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.db)
        .await?;

        let Some((categories, matrix, summary, updated_at)) = row else {
            return Ok(None);
        };

        // Re-validate: a corrupt row is an error, never a silent fallback
        let model = TransitionModel::new(
            serde_json::from_str(&categories)?,
            serde_json::from_str(&matrix)?,
        )?;

        Ok(Some(ModelRecord {
            model,
            summary: serde_json::from_str(&summary)?,
            updated_at,
        }))
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transition_models WHERE user_guid = ?")
            .bind(user_id.to_string())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-process store for tests and embedded use
#[derive(Default)]
pub struct MemoryModelStore {
    records: RwLock<HashMap<Uuid, ModelRecord>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn save(&self, user_id: Uuid, record: &ModelRecord) -> Result<()> {
        self.records.write().await.insert(user_id, record.clone());
        Ok(())
    }

    async fn load(&self, user_id: Uuid) -> Result<Option<ModelRecord>> {
        Ok(self.records.read().await.get(&user_id).cloned())
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.records.write().await.remove(&user_id).is_some())
    }
}
