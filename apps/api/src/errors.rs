use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::assistant::AssistantError;
use crate::drafts::DraftError;
use crate::export::{ExportError, EXPORT_FAILED_MESSAGE};
use crate::llm_client::LlmError;
use crate::models::edit::EditError;

const ASSISTANT_FAILED_MESSAGE: &str =
    "No se pudo completar la solicitud a la IA. Inténtalo de nuevo.";
const MISSING_KEY_MESSAGE: &str =
    "El servicio de IA no se ha inicializado. Por favor, configura tu API Key primero.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Messages are user-facing and localized; internal detail only goes to logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::UnknownEntry { .. } => AppError::NotFound(err.to_string()),
            EditError::EndDateLocked | EditError::InvalidColor(_) => {
                AppError::Validation(err.to_string())
            }
        }
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Validation(msg) => AppError::Validation(msg),
            AssistantError::Llm(LlmError::MissingApiKey) => AppError::MissingApiKey,
            AssistantError::PdfText(detail) => {
                tracing::warn!("PDF text extraction failed: {detail}");
                AppError::UnprocessableEntity("No se pudo leer el texto del PDF.".to_string())
            }
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<DraftError> for AppError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::NotFound(id) => AppError::NotFound(format!("Borrador {id} no encontrado")),
            DraftError::Database(e) => AppError::Database(e),
            DraftError::Corrupt(e) => AppError::Internal(anyhow::anyhow!("corrupt draft: {e}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::MissingApiKey => (
                StatusCode::BAD_REQUEST,
                "MISSING_API_KEY",
                MISSING_KEY_MESSAGE.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Ocurrió un error al acceder a los borradores.".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    ASSISTANT_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    EXPORT_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Ocurrió un error interno.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
