// Named document snapshots. One row per saved draft; the document travels as
// JSONB. Listing is newest first.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::document::Document;
use crate::models::draft::{DraftRow, SavedDraft};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored draft is not a valid document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn save(&self, document: Document) -> Result<SavedDraft, DraftError>;
    async fn list(&self) -> Result<Vec<SavedDraft>, DraftError>;
    async fn get(&self, id: Uuid) -> Result<SavedDraft, DraftError>;
    async fn delete(&self, id: Uuid) -> Result<(), DraftError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store (no DATABASE_URL)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<Uuid, SavedDraft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SavedDraft>> {
        self.drafts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn save(&self, document: Document) -> Result<SavedDraft, DraftError> {
        let draft = SavedDraft::new(document);
        self.lock().insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn list(&self) -> Result<Vec<SavedDraft>, DraftError> {
        let mut drafts: Vec<SavedDraft> = self.lock().values().cloned().collect();
        drafts.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(drafts)
    }

    async fn get(&self, id: Uuid) -> Result<SavedDraft, DraftError> {
        self.lock().get(&id).cloned().ok_or(DraftError::NotFound(id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DraftError> {
        self.lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(DraftError::NotFound(id))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres store
// ────────────────────────────────────────────────────────────────────────────

pub struct PgDraftStore {
    pool: PgPool,
}

impl PgDraftStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the drafts table when missing.
    pub async fn ensure_schema(&self) -> Result<(), DraftError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cv_drafts (
                id            UUID PRIMARY KEY,
                document      JSONB NOT NULL,
                last_modified TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        info!("cv_drafts schema ready");
        Ok(())
    }
}

#[async_trait]
impl DraftStore for PgDraftStore {
    async fn save(&self, document: Document) -> Result<SavedDraft, DraftError> {
        let draft = SavedDraft::new(document);
        let json = serde_json::to_value(&draft.document)?;
        sqlx::query("INSERT INTO cv_drafts (id, document, last_modified) VALUES ($1, $2, $3)")
            .bind(draft.id)
            .bind(json)
            .bind(draft.last_modified)
            .execute(&self.pool)
            .await?;
        Ok(draft)
    }

    async fn list(&self) -> Result<Vec<SavedDraft>, DraftError> {
        let rows: Vec<DraftRow> = sqlx::query_as(
            "SELECT id, document, last_modified FROM cv_drafts ORDER BY last_modified DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| SavedDraft::try_from(row).map_err(DraftError::from))
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<SavedDraft, DraftError> {
        let row: Option<DraftRow> =
            sqlx::query_as("SELECT id, document, last_modified FROM cv_drafts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let row = row.ok_or(DraftError::NotFound(id))?;
        Ok(SavedDraft::try_from(row)?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DraftError> {
        let result = sqlx::query("DELETE FROM cv_drafts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DraftError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Document {
        let mut doc = Document::default();
        doc.personal.name = name.into();
        doc
    }

    #[tokio::test]
    async fn test_memory_store_lists_newest_first() {
        let store = MemoryDraftStore::new();
        let first = store.save(named("Ana")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.save(named("Luis")).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_memory_store_get_and_delete() {
        let store = MemoryDraftStore::new();
        let draft = store.save(named("Ana")).await.unwrap();
        assert_eq!(store.get(draft.id).await.unwrap().document.personal.name, "Ana");

        store.delete(draft.id).await.unwrap();
        assert!(matches!(store.get(draft.id).await, Err(DraftError::NotFound(_))));
        assert!(matches!(store.delete(draft.id).await, Err(DraftError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_saved_draft_is_a_snapshot() {
        let store = MemoryDraftStore::new();
        let mut doc = named("Ana");
        let draft = store.save(doc.clone()).await.unwrap();
        doc.personal.name = "Otra".into();
        assert_eq!(store.get(draft.id).await.unwrap().document.personal.name, "Ana");
    }
}
