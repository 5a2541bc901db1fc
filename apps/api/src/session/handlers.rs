use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assistant::extract::pdf_to_text;
use crate::assistant::{self, CvAssistant, DescriptionKind, DescriptionSubject};
use crate::errors::AppError;
use crate::export::surface::Presentation;
use crate::letter::{letter_file_name, render_letter_pdf, ApplicationContext, CoverLetterView};
use crate::models::document::Document;
use crate::models::edit::{
    Applied, Collection, Edit, EntryChange, ExperienceChange, TrainingChange,
};
use crate::preview::Viewport;
use crate::render::layout::Page;
use crate::render::Template;
use crate::session::{AiPermit, Field, Session, SessionHandle, SessionView, Ticket};
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";
const AI_BUSY_MESSAGE: &str = "Ya hay una acción de IA en curso. Espera a que termine.";
const STALE_RESULT_MESSAGE: &str =
    "El CV cambió mientras la IA trabajaba. Vuelve a intentarlo.";
const ENTRY_GONE_MESSAGE: &str = "La entrada ya no existe.";
const NO_LETTER_MESSAGE: &str = "Todavía no se ha generado una carta de presentación.";

fn find_session(state: &AppState, id: Uuid) -> Result<Arc<SessionHandle>, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Sesión {id} no encontrada")))
}

fn request_api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Session, AI slot and assistant for one AI action. The permit must live
/// until the result has been applied.
fn begin_ai(
    state: &AppState,
    id: Uuid,
    headers: &HeaderMap,
) -> Result<(Arc<SessionHandle>, AiPermit, Arc<dyn CvAssistant>), AppError> {
    let handle = find_session(state, id)?;
    let permit = handle
        .try_begin_ai()
        .ok_or_else(|| AppError::Conflict(AI_BUSY_MESSAGE.to_string()))?;
    let assistant = state.assistants.assistant(request_api_key(headers))?;
    Ok((handle, permit, assistant))
}

/// Rejects a result computed from a replaced document or, when `field` is
/// given, one that would overwrite a manual edit made while the AI worked.
fn ensure_current(
    session: &Session,
    ticket: Ticket,
    field: Option<Field>,
) -> Result<(), AppError> {
    let current = match field {
        Some(field) => session.is_untouched(ticket, field),
        None => session.is_current(ticket),
    };
    if current {
        Ok(())
    } else {
        warn!(session = %session.id, "discarding stale AI result");
        Err(AppError::Conflict(STALE_RESULT_MESSAGE.to_string()))
    }
}

fn pdf_response(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle and editing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    pub document: Option<Document>,
    pub draft_id: Option<Uuid>,
    pub template: Template,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let document = match (req.draft_id, req.document) {
        (Some(draft_id), _) => state.drafts.get(draft_id).await?.document,
        (None, Some(document)) => document,
        (None, None) => Document::default(),
    };
    let handle = state.sessions.create(document, req.template);
    let session = handle.state.lock().await;
    info!(session = %session.id, template = ?req.template, "session created");
    Ok((StatusCode::CREATED, Json(session.view())))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id)?;
    let session = handle.state.lock().await;
    Ok(Json(session.view()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id) {
        return Err(AppError::NotFound(format!("Sesión {id} no encontrada")));
    }
    info!(session = %id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct EditResponse {
    pub applied: Applied,
    pub session: SessionView,
}

/// POST /api/v1/sessions/:id/edits
pub async fn handle_apply_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(edit): Json<Edit>,
) -> Result<Json<EditResponse>, AppError> {
    let handle = find_session(&state, id)?;
    let mut session = handle.state.lock().await;
    let applied = session.apply_edit(edit)?;
    Ok(Json(EditResponse {
        applied,
        session: session.view(),
    }))
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub template: Template,
}

/// PUT /api/v1/sessions/:id/template
pub async fn handle_switch_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id)?;
    let mut session = handle.state.lock().await;
    session.switch_template(req.template);
    Ok(Json(session.view()))
}

#[derive(Serialize)]
pub struct PreviewResponse {
    /// False when a newer preview request arrived during the debounce window.
    pub applied: bool,
    pub presentation: Presentation,
    pub natural_width: f32,
    pub natural_height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
}

/// POST /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(viewport): Json<Viewport>,
) -> Result<Json<PreviewResponse>, AppError> {
    let handle = find_session(&state, id)?;
    let applied = handle.debouncer.settle().await;

    let mut session = handle.state.lock().await;
    if !applied {
        let (natural_width, natural_height) = session.natural_size();
        return Ok(Json(PreviewResponse {
            applied,
            presentation: session.surface().presentation(),
            natural_width,
            natural_height,
            page: None,
        }));
    }

    let presentation = session.set_viewport(viewport);
    let (natural_width, natural_height) = session.natural_size();
    Ok(Json(PreviewResponse {
        applied,
        presentation,
        natural_width,
        natural_height,
        page: Some(session.surface().page().clone()),
    }))
}

/// POST /api/v1/sessions/:id/export
/// The session lock is held for the whole export.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let handle = find_session(&state, id)?;
    let mut session = handle.state.lock().await;
    let name = session.document().personal.name.clone();
    let pdf = state.export.export(session.surface_mut(), &name).await?;
    Ok(pdf_response(&pdf.file_name, pdf.bytes))
}

// ────────────────────────────────────────────────────────────────────────────
// AI actions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/ai/summary
pub async fn handle_ai_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, AppError> {
    let (handle, _permit, assistant) = begin_ai(&state, id, &headers)?;
    let (document, ticket) = {
        let session = handle.state.lock().await;
        (session.document().clone(), session.ticket())
    };

    let summary = assistant::summary_for(assistant.as_ref(), &document).await?;

    let mut session = handle.state.lock().await;
    ensure_current(&session, ticket, Some(Field::Summary))?;
    session.update(|doc| Edit::SetSummary { value: summary }.apply(doc))?;
    Ok(Json(session.view()))
}

#[derive(Deserialize)]
pub struct DescriptionRequest {
    pub collection: Collection,
    pub id: Uuid,
}

fn description_target(
    doc: &Document,
    collection: Collection,
    id: Uuid,
) -> Result<Option<(DescriptionSubject, String)>, AppError> {
    match collection {
        Collection::Experience => Ok(doc.experience.iter().find(|e| e.id == id).map(|e| {
            (
                DescriptionSubject::Experience {
                    position: e.position.clone(),
                    company: e.company.clone(),
                },
                e.description.clone(),
            )
        })),
        Collection::ComplementaryTraining => Ok(doc
            .complementary_training
            .iter()
            .find(|t| t.id == id)
            .map(|t| {
                (
                    DescriptionSubject::Training {
                        course: t.course.clone(),
                        institution: t.institution.clone(),
                    },
                    t.description.clone(),
                )
            })),
        Collection::Education | Collection::Skills => Err(AppError::Validation(format!(
            "Las entradas de {collection} no tienen descripción."
        ))),
    }
}

/// POST /api/v1/sessions/:id/ai/description
/// Improves the entry's description, or generates one when it is empty.
pub async fn handle_ai_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<DescriptionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let (handle, _permit, assistant) = begin_ai(&state, id, &headers)?;
    let (subject, existing, ticket) = {
        let session = handle.state.lock().await;
        let (subject, existing) = description_target(session.document(), req.collection, req.id)?
            .ok_or_else(|| AppError::NotFound(ENTRY_GONE_MESSAGE.to_string()))?;
        (subject, existing, session.ticket())
    };

    let text = assistant::description_for(assistant.as_ref(), &subject, &existing).await?;

    let mut session = handle.state.lock().await;
    ensure_current(&session, ticket, Some(Field::Entry(req.id)))?;
    if description_target(session.document(), req.collection, req.id)?.is_none() {
        return Err(AppError::Conflict(ENTRY_GONE_MESSAGE.to_string()));
    }
    let change = match subject.kind() {
        DescriptionKind::Experience => EntryChange::Experience(ExperienceChange::Description(text)),
        DescriptionKind::ComplementaryTraining => {
            EntryChange::ComplementaryTraining(TrainingChange::Description(text))
        }
    };
    session.update(|doc| Edit::UpdateEntry { id: req.id, change }.apply(doc))?;
    Ok(Json(session.view()))
}

#[derive(Deserialize)]
pub struct ImproveRequest {
    pub text: String,
    pub kind: DescriptionKind,
}

#[derive(Serialize)]
pub struct ImproveResponse {
    pub text: String,
}

/// POST /api/v1/sessions/:id/ai/improve
/// Rewrites a free text without touching the document.
pub async fn handle_ai_improve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    let (_handle, _permit, assistant) = begin_ai(&state, id, &headers)?;
    let text = assistant::improve_text(assistant.as_ref(), &req.text, req.kind).await?;
    Ok(Json(ImproveResponse { text }))
}

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

/// Pasted text from a JSON body, or the text layer of an uploaded PDF
/// (`file` field) / a `text` field from a multipart form.
async fn extract_input(state: &AppState, request: Request) -> Result<String, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(body) = Json::<ExtractRequest>::from_request(request, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        return Ok(body.text);
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?;
    let mut text = String::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                text = tokio::task::spawn_blocking(move || pdf_to_text(&bytes))
                    .await
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF task failed: {e}")))??;
            }
            Some("text") => {
                text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
            }
            _ => {}
        }
    }
    Ok(text)
}

/// POST /api/v1/sessions/:id/ai/extract
/// Replaces the whole document with what was extracted.
pub async fn handle_ai_extract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Request,
) -> Result<Json<SessionView>, AppError> {
    let (handle, _permit, assistant) = begin_ai(&state, id, request.headers())?;
    let ticket = handle.state.lock().await.ticket();

    let cv_text = extract_input(&state, request).await?;
    let document = assistant::document_from_text(assistant.as_ref(), &cv_text).await?;

    let mut session = handle.state.lock().await;
    ensure_current(&session, ticket, None)?;
    session.replace_document(document);
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/ai/cover-letter
pub async fn handle_ai_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(application): Json<ApplicationContext>,
) -> Result<Json<CoverLetterView>, AppError> {
    let (handle, _permit, assistant) = begin_ai(&state, id, &headers)?;
    let application = application.normalized();
    let (document, ticket) = {
        let session = handle.state.lock().await;
        (session.document().clone(), session.ticket())
    };

    let letter = assistant::cover_letter_for(assistant.as_ref(), &document, &application).await?;

    let mut session = handle.state.lock().await;
    ensure_current(&session, ticket, None)?;
    let view = CoverLetterView::new(&letter);
    session.set_cover_letter(letter);
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter and drafts
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions/:id/cover-letter
pub async fn handle_get_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CoverLetterView>, AppError> {
    let handle = find_session(&state, id)?;
    let session = handle.state.lock().await;
    let letter = session
        .cover_letter()
        .ok_or_else(|| AppError::NotFound(NO_LETTER_MESSAGE.to_string()))?;
    Ok(Json(CoverLetterView::new(letter)))
}

/// POST /api/v1/sessions/:id/cover-letter/pdf
pub async fn handle_cover_letter_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let handle = find_session(&state, id)?;
    let (letter, name) = {
        let session = handle.state.lock().await;
        let letter = session
            .cover_letter()
            .ok_or_else(|| AppError::NotFound(NO_LETTER_MESSAGE.to_string()))?
            .to_string();
        (letter, session.document().personal.name.clone())
    };

    let file_name = letter_file_name(&name);
    let bytes = tokio::task::spawn_blocking(move || render_letter_pdf(&letter, &name))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("letter task failed: {e}")))??;
    info!(%file_name, size = bytes.len(), "cover letter exported");
    Ok(pdf_response(&file_name, bytes))
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub id: Uuid,
    pub name: String,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

/// POST /api/v1/sessions/:id/save
pub async fn handle_save_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SaveResponse>), AppError> {
    let handle = find_session(&state, id)?;
    let document = handle.state.lock().await.document().clone();
    let draft = state.drafts.save(document).await?;
    info!(draft = %draft.id, "draft saved");
    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            id: draft.id,
            name: draft.label().to_string(),
            last_modified: draft.last_modified,
        }),
    ))
}
