pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::drafts::handlers as drafts;
use crate::session::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Editing sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/edits", post(sessions::handle_apply_edit))
        .route(
            "/api/v1/sessions/:id/template",
            put(sessions::handle_switch_template),
        )
        .route("/api/v1/sessions/:id/preview", post(sessions::handle_preview))
        .route("/api/v1/sessions/:id/export", post(sessions::handle_export))
        // AI actions
        .route(
            "/api/v1/sessions/:id/ai/summary",
            post(sessions::handle_ai_summary),
        )
        .route(
            "/api/v1/sessions/:id/ai/description",
            post(sessions::handle_ai_description),
        )
        .route(
            "/api/v1/sessions/:id/ai/improve",
            post(sessions::handle_ai_improve),
        )
        .route(
            "/api/v1/sessions/:id/ai/extract",
            post(sessions::handle_ai_extract),
        )
        .route(
            "/api/v1/sessions/:id/ai/cover-letter",
            post(sessions::handle_ai_cover_letter),
        )
        // Cover letter
        .route(
            "/api/v1/sessions/:id/cover-letter",
            get(sessions::handle_get_cover_letter),
        )
        .route(
            "/api/v1/sessions/:id/cover-letter/pdf",
            post(sessions::handle_cover_letter_pdf),
        )
        // Drafts
        .route("/api/v1/sessions/:id/save", post(sessions::handle_save_draft))
        .route("/api/v1/drafts", get(drafts::handle_list_drafts))
        .route(
            "/api/v1/drafts/:id",
            get(drafts::handle_get_draft).delete(drafts::handle_delete_draft),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tokio::sync::Notify;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::assistant::testing::{FixedProvider, ScriptedAssistant};
    use crate::drafts::MemoryDraftStore;
    use crate::export::{ExportEngine, RusttypeRasterizer, EXPORT_FAILED_MESSAGE};
    use crate::session::SessionStore;

    fn app_with(assistant: Arc<ScriptedAssistant>) -> (Router, AppState) {
        let rasterizer = RusttypeRasterizer::load(
            Path::new("/nonexistent/regular.ttf"),
            Path::new("/nonexistent/bold.ttf"),
        );
        let state = AppState {
            sessions: SessionStore::new(Duration::from_millis(1)),
            drafts: Arc::new(MemoryDraftStore::new()),
            assistants: Arc::new(FixedProvider(assistant)),
            export: ExportEngine::new(Arc::new(rasterizer)),
        };
        (build_router(state.clone()), state)
    }

    fn app() -> Router {
        app_with(Arc::new(ScriptedAssistant::replying("Texto generado."))).0
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn call_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = call(app, method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_session(app: &Router, body: Value) -> String {
        let (status, view) = call_json(app, "POST", "/api/v1/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        view["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call_json(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let uri = format!("/api/v1/sessions/{}", Uuid::new_v4());
        let (status, body) = call_json(&app(), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_edits_update_document() {
        let app = app();
        let id = new_session(&app, json!({})).await;
        let uri = format!("/api/v1/sessions/{id}/edits");

        let (status, body) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"op": "set_personal", "field": "name", "value": "Ana Perez"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["document"]["personal"]["name"], "Ana Perez");

        let (status, body) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"op": "add_entry", "collection": "experience"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"]["result"], "added");

        let (status, body) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"op": "set_accent_color", "value": "azul"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_preview_scales_to_viewport() {
        let app = app();
        let id = new_session(&app, json!({})).await;
        let uri = format!("/api/v1/sessions/{id}/preview");
        let (status, body) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"container_width": 448.0, "horizontal_padding": 40.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["presentation"]["scale"], 0.5);
        assert!(body["page"].is_object());
    }

    #[tokio::test]
    async fn test_classic_export_downloads_pdf() {
        let app = app();
        let id = new_session(&app, json!({"document": {"personal": {"name": "Ana Perez"}}})).await;
        let response = call(&app, "POST", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("CV_Ana_Perez.pdf"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_file_name_is_sanitized() {
        let app = app();
        let name = "Ana\n\"Pérez\"/x";
        let id = new_session(&app, json!({"document": {"personal": {"name": name}}})).await;
        let response = call(&app, "POST", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].as_bytes().to_vec();
        assert_eq!(
            String::from_utf8(disposition).unwrap(),
            "attachment; filename=\"CV_Ana__Pérez__x.pdf\""
        );
    }

    #[tokio::test]
    async fn test_deleted_session_is_not_found() {
        let (app, state) = app_with(Arc::new(ScriptedAssistant::replying("x")));
        let id = new_session(&app, json!({})).await;
        let uri = format!("/api/v1/sessions/{id}");

        let (status, _) = call_json(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.sessions.len(), 0);

        let (status, body) = call_json(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        let (status, _) = call_json(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_export_restores_presentation() {
        let app = app();
        let id = new_session(&app, json!({"template": "modern"})).await;
        let (_, before) = call_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;

        let (status, body) =
            call_json(&app, "POST", &format!("/api/v1/sessions/{id}/export"), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], EXPORT_FAILED_MESSAGE);

        let (_, after) = call_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(before["presentation"], after["presentation"]);
    }

    #[tokio::test]
    async fn test_ai_summary_applies_result() {
        let assistant = Arc::new(ScriptedAssistant::replying("Analista con experiencia."));
        let (app, _) = app_with(assistant.clone());
        let id = new_session(&app, json!({"document": {"summary": "Analista."}})).await;

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/ai/summary"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document"]["summary"], "Analista con experiencia.");
        assert_eq!(assistant.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_ai_action_conflicts() {
        let (app, state) = app_with(Arc::new(ScriptedAssistant::replying("x")));
        let id = new_session(&app, json!({})).await;
        let handle = state.sessions.get(id.parse().unwrap()).unwrap();
        let _pending = handle.try_begin_ai().unwrap();

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/ai/summary"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_manual_summary_survives_pending_ai_summary() {
        let gate = Arc::new(Notify::new());
        let assistant = Arc::new(ScriptedAssistant::gated("Resumen de la IA.", gate.clone()));
        let (app, _) = app_with(assistant.clone());
        let id = new_session(&app, json!({"document": {"summary": "Inicial."}})).await;

        let pending = tokio::spawn({
            let app = app.clone();
            let uri = format!("/api/v1/sessions/{id}/ai/summary");
            async move { call_json(&app, "POST", &uri, None).await }
        });
        while assistant.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let (status, _) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/edits"),
            Some(json!({"op": "set_summary", "value": "Escrito a mano."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        gate.notify_one();
        let (status, body) = pending.await.unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let (_, view) = call_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["document"]["summary"], "Escrito a mano.");
    }

    #[tokio::test]
    async fn test_ai_failure_leaves_document() {
        let (app, _) = app_with(Arc::new(ScriptedAssistant::failing()));
        let id = new_session(&app, json!({"document": {"summary": "Original."}})).await;

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/ai/summary"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (_, view) = call_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["document"]["summary"], "Original.");
    }

    #[tokio::test]
    async fn test_description_generation_validates_entry() {
        let assistant = Arc::new(ScriptedAssistant::replying("- Lideré el equipo"));
        let (app, _) = app_with(assistant.clone());
        let id = new_session(&app, json!({})).await;
        let (_, added) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/edits"),
            Some(json!({"op": "add_entry", "collection": "experience"})),
        )
        .await;
        let entry = added["applied"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/sessions/{id}/ai/description");

        let (status, _) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"collection": "experience", "id": entry})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(assistant.calls(), 0);

        for (field, value) in [("position", "Jefa"), ("company", "ACME")] {
            call_json(
                &app,
                "POST",
                &format!("/api/v1/sessions/{id}/edits"),
                Some(json!({
                    "op": "update_entry",
                    "id": entry,
                    "change": {"collection": "experience", "change": {"field": field, "value": value}}
                })),
            )
            .await;
        }
        let (status, body) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"collection": "experience", "id": entry})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document"]["experience"][0]["description"], "Lideré el equipo");

        let (status, _) = call_json(
            &app,
            "POST",
            &uri,
            Some(json!({"collection": "experience", "id": Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_extract_replaces_document() {
        let reply = r#"{"personal": {"name": "Luis Soto"}, "skills": [{"skill": "SQL"}]}"#;
        let (app, _) = app_with(Arc::new(ScriptedAssistant::replying(reply)));
        let id = new_session(&app, json!({"document": {"summary": "Antiguo."}})).await;

        let (status, body) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/ai/extract"),
            Some(json!({"text": "Luis Soto, SQL"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document"]["personal"]["name"], "Luis Soto");
        assert_eq!(body["document"]["summary"], "");
        assert_eq!(body["document"]["skills"][0]["skill"], "SQL");
    }

    #[tokio::test]
    async fn test_cover_letter_flow() {
        let letter = "Estimados/as señores/as:\n\nMe postulo con **entusiasmo**.\n- Liderazgo";
        let (app, _) = app_with(Arc::new(ScriptedAssistant::replying(letter)));
        let id = new_session(&app, json!({"document": {"personal": {"name": "Ana Perez"}}})).await;

        let (status, _) =
            call_json(&app, "GET", &format!("/api/v1/sessions/{id}/cover-letter"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, view) = call_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/ai/cover-letter"),
            Some(json!({"job_title": "analista", "is_company_unknown": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!view["plain_text"].as_str().unwrap().contains("**"));

        let response = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/cover-letter/pdf"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("Carta_Presentacion_Ana_Perez.pdf"));
    }

    #[tokio::test]
    async fn test_drafts_round_trip_through_sessions() {
        let app = app();
        let id = new_session(&app, json!({"document": {"personal": {"name": "Ana Perez"}}})).await;

        let (status, saved) =
            call_json(&app, "POST", &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["name"], "Ana Perez");
        let draft_id = saved["id"].as_str().unwrap().to_string();

        let (_, list) = call_json(&app, "GET", "/api/v1/drafts", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, view) =
            call_json(&app, "POST", "/api/v1/sessions", Some(json!({"draft_id": draft_id}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view["document"]["personal"]["name"], "Ana Perez");

        let uri = format!("/api/v1/drafts/{draft_id}");
        let (status, _) = call_json(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call_json(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
