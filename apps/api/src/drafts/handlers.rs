use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::draft::{DraftSummary, SavedDraft};
use crate::state::AppState;

/// GET /api/v1/drafts
/// Newest first.
pub async fn handle_list_drafts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DraftSummary>>, AppError> {
    let drafts = state.drafts.list().await?;
    Ok(Json(drafts.iter().map(DraftSummary::from).collect()))
}

/// GET /api/v1/drafts/:id
pub async fn handle_get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedDraft>, AppError> {
    Ok(Json(state.drafts.get(id).await?))
}

/// DELETE /api/v1/drafts/:id
pub async fn handle_delete_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.drafts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
