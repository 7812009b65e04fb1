pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::templates::handlers as templates;
use crate::wizard::handlers as wizard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Template picker
        .route("/api/v1/templates", get(templates::handle_list_templates))
        // Editing sessions
        .route("/api/v1/sessions", post(wizard::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(wizard::handle_get_session).delete(wizard::handle_discard_session),
        )
        .route("/api/v1/sessions/:id/fields", patch(wizard::handle_update_field))
        .route("/api/v1/sessions/:id/next", post(wizard::handle_next))
        .route("/api/v1/sessions/:id/prev", post(wizard::handle_prev))
        .route("/api/v1/sessions/:id/goto", post(wizard::handle_go_to))
        .route(
            "/api/v1/sessions/:id/sections",
            post(wizard::handle_select_section),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section/open",
            post(wizard::handle_open_section),
        )
        .route("/api/v1/sessions/:id/template", put(wizard::handle_set_template))
        .route("/api/v1/sessions/:id/validation", get(wizard::handle_validation))
        .route("/api/v1/sessions/:id/preview", get(wizard::handle_preview))
        // Submit flow
        .route("/api/v1/sessions/:id/submit", post(wizard::handle_submit))
        .route(
            "/api/v1/sessions/:id/submit/confirm",
            post(wizard::handle_submit_confirm),
        )
        .route(
            "/api/v1/sessions/:id/submit/name",
            post(wizard::handle_submit_name),
        )
        .route(
            "/api/v1/sessions/:id/submit/cancel",
            post(wizard::handle_submit_cancel),
        )
        .route(
            "/api/v1/sessions/:id/document",
            delete(wizard::handle_delete_document),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::document::model::DocumentKind;
    use crate::gateway::{DocumentGateway, InMemoryGateway};

    fn app_with(gateway: Arc<InMemoryGateway>) -> Router {
        build_router(AppState::new(Config::default(), gateway))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router, body: Value) -> String {
        let (status, view) = call(app, Method::POST, "/api/v1/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        view["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], json!("memory"));
        assert_eq!(body["service"], json!("studio"));
    }

    #[tokio::test]
    async fn test_templates_collapsed_and_full() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let (_, collapsed) = call(&app, Method::GET, "/api/v1/templates", None).await;
        assert_eq!(collapsed["templates"].as_array().unwrap().len(), 5);
        assert_eq!(collapsed["default_id"], json!("classic"));

        let (_, two) = call(&app, Method::GET, "/api/v1/templates?limit=2", None).await;
        assert_eq!(two["templates"].as_array().unwrap().len(), 2);

        let (_, all) = call(&app, Method::GET, "/api/v1/templates?all=true", None).await;
        assert_eq!(
            all["templates"].as_array().unwrap().len(),
            all["total"].as_u64().unwrap() as usize
        );
    }

    #[tokio::test]
    async fn test_next_blocked_on_empty_personal_step() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let id = new_session(&app, json!({"kind": "cv"})).await;

        let (status, body) =
            call(&app, Method::POST, &format!("/api/v1/sessions/{id}/next"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
        assert_eq!(
            body["error"]["details"]["errors"]["firstName"],
            json!("First name is required")
        );

        let (_, view) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["step"], json!(1));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_skill_edit_syncs_matched_view() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let id = new_session(&app, json!({"kind": "resume"})).await;

        let (status, view) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/sessions/{id}/fields"),
            Some(json!({"field": "skills", "value": ["Rust", "Go"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let matched = view["document"]["matchedSkills"].as_array().unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0]["skill"], json!("Rust"));
        assert_eq!(matched[0]["relevance"], json!(100));
    }

    #[tokio::test]
    async fn test_section_open_requires_picker_step() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let id = new_session(&app, json!({"kind": "cv"})).await;

        call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/sections"),
            Some(json!({"section": "projects"})),
        )
        .await;
        let open = format!("/api/v1/sessions/{id}/sections/projects/open");
        let (status, _) = call(&app, Method::POST, &open, None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/goto"),
            Some(json!({"step": 6})),
        )
        .await;
        let (status, view) = call(&app, Method::POST, &open, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["subSection"], json!("projects"));

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/goto"),
            Some(json!({"step": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_template_falls_back_to_default() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let id = new_session(&app, json!({"kind": "cv"})).await;
        let (_, view) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/sessions/{id}/template"),
            Some(json!({"id": "neon-unicorn"})),
        )
        .await;
        assert_eq!(view["document"]["template"]["id"], json!("classic"));
    }

    #[tokio::test]
    async fn test_full_flow_persists_through_gateway() {
        let gateway = Arc::new(InMemoryGateway::new());
        let app = app_with(Arc::clone(&gateway));
        let id = new_session(&app, json!({"kind": "cv"})).await;
        let base = format!("/api/v1/sessions/{id}");

        call(
            &app,
            Method::PATCH,
            &format!("{base}/fields"),
            Some(json!({
                "field": "personalInfo",
                "value": {"firstName": "Ann", "lastName": "Lee", "email": "ann@x.com"}
            })),
        )
        .await;
        for _ in 0..6 {
            let (status, _) = call(&app, Method::POST, &format!("{base}/next"), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        // Headline is empty: a plain submit asks for an override.
        let (status, body) = call(&app, Method::POST, &format!("{base}/submit"), Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["details"]["warnings"]["professionalHeadline"].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("{base}/submit"),
            Some(json!({"saveAnyway": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scrollLocked"], json!(true));

        let (status, _) = call(&app, Method::POST, &format!("{base}/submit/confirm"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, view) = call(
            &app,
            Method::POST,
            &format!("{base}/submit/name"),
            Some(json!({"title": "Backend CV"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["submitStage"], json!("idle"));
        assert_eq!(view["scrollLocked"], json!(false));
        assert_eq!(view["document"]["id"], json!("1"));

        let stored = gateway.fetch(DocumentKind::Cv, "1").await.unwrap();
        assert_eq!(stored["title"], json!("Backend CV"));
        assert!(stored.get("originalPersonalInfo").is_none());

        // Delete through the gateway.
        let (status, view) = call(&app, Method::DELETE, &format!("{base}/document"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(view["document"]["id"].is_null());
        assert_eq!(gateway.len().await, 0);
    }

    #[tokio::test]
    async fn test_session_from_stored_document() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway
            .insert(
                DocumentKind::Resume,
                "r-7",
                json!({
                    "personalInfo": {"firstName": "Ann", "professionalHeadline": "Engineer"},
                    "skills": ["Rust"],
                    "matchedSkills": [{"skill": "Rust", "relevance": 80}],
                    "roleApply": "SRE"
                }),
            )
            .await;
        let app = app_with(gateway);

        let (status, view) = call(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"kind": "resume", "documentId": "r-7"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view["document"]["id"], json!("r-7"));
        assert_eq!(view["document"]["matchedSkills"][0]["relevance"], json!(80));
        assert_eq!(
            view["document"]["personalInfo"]["professionalHeadline"],
            json!("SRE")
        );

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"kind": "resume", "documentId": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_loosely_typed_document_still_opens() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let (status, view) = call(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({
                "kind": "resume",
                "document": {
                    "personalInfo": {"firstName": "Ann", "phone": null},
                    "education": [{"school": "MIT", "gpa": 3.8}],
                    "experience": [{"position": "Eng", "title": "Eng"}]
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view["document"]["education"][0]["gpa"], json!("3.8"));
        assert_eq!(view["document"]["experience"][0]["position"], json!("Eng"));
        assert_eq!(view["document"]["personalInfo"]["phone"], json!(""));
    }

    #[tokio::test]
    async fn test_preview_returns_html() {
        let app = app_with(Arc::new(InMemoryGateway::new()));
        let id = new_session(&app, json!({"kind": "cv"})).await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/sessions/{id}/preview?template=modern"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Your Name"));
    }
}
