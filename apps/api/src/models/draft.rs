use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::document::Document;

/// A row of the `cv_drafts` table. The document is stored as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct DraftRow {
    pub id: Uuid,
    pub document: Value,
    pub last_modified: DateTime<Utc>,
}

/// A named snapshot of a full document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDraft {
    pub id: Uuid,
    pub document: Document,
    pub last_modified: DateTime<Utc>,
}

impl SavedDraft {
    pub fn new(document: Document) -> Self {
        Self {
            id: Uuid::new_v4(),
            document,
            last_modified: Utc::now(),
        }
    }

    /// Display label in the draft list: the person's name or a fallback.
    pub fn label(&self) -> &str {
        let name = self.document.personal.name.trim();
        if name.is_empty() {
            "CV sin nombre"
        } else {
            name
        }
    }
}

impl TryFrom<DraftRow> for SavedDraft {
    type Error = serde_json::Error;

    fn try_from(row: DraftRow) -> Result<Self, Self::Error> {
        let document: Document = serde_json::from_value(row.document)?;
        Ok(Self {
            id: row.id,
            document: document.normalized(),
            last_modified: row.last_modified,
        })
    }
}

/// Draft list item returned by the list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSummary {
    pub id: Uuid,
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

impl From<&SavedDraft> for DraftSummary {
    fn from(draft: &SavedDraft) -> Self {
        Self {
            id: draft.id,
            name: draft.label().to_string(),
            last_modified: draft.last_modified,
        }
    }
}
