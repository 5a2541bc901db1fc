use std::sync::Arc;

use crate::assistant::AssistantProvider;
use crate::drafts::DraftStore;
use crate::export::ExportEngine;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Postgres-backed when `DATABASE_URL` is set, in-memory otherwise.
    pub drafts: Arc<dyn DraftStore>,
    /// Hands out an assistant for the request's API key (or the default one).
    pub assistants: Arc<dyn AssistantProvider>,
    pub export: ExportEngine,
}
