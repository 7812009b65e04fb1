use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::document::hydrate::hydrate_value;
use crate::document::model::{Document, DocumentKind, TemplateRef};
use crate::document::sync::FieldUpdate;
use crate::errors::AppError;
use crate::state::AppState;
use crate::templates::registry;
use crate::wizard::sequencer::{SectionId, Step, Transition};
use crate::wizard::session::{EditingSession, SessionView, SubmitStageName};
use crate::wizard::store::SharedSession;
use crate::wizard::validation::ValidationReport;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub kind: DocumentKind,
    pub document_id: Option<String>,
    /// A raw record handed over directly, e.g. from a listing page.
    pub document: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GoToRequest {
    pub step: u8,
}

#[derive(Debug, Deserialize)]
pub struct SelectSectionRequest {
    pub section: SectionId,
}

#[derive(Debug, Deserialize)]
pub struct SetTemplateRequest {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub save_anyway: bool,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub transition: Transition,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub submit_stage: SubmitStageName,
    pub scroll_locked: bool,
    pub validation: ValidationReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSectionResponse {
    pub added: bool,
    pub session: SessionView,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let document = match (req.document, req.document_id.as_deref()) {
        (Some(raw), _) => hydrate_value(raw, req.kind),
        (None, Some(id)) => {
            let raw = state.gateway.fetch(req.kind, id).await?;
            hydrate_value(raw, req.kind)
        }
        (None, None) => Document::new(req.kind),
    };

    let session = EditingSession::new(document);
    let view = session.view();
    state.sessions.insert(session).await;
    info!(
        "session {} opened for {} {}",
        view.id,
        view.kind.resource(),
        view.document.id.as_deref().unwrap_or("<new>")
    );
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        info!("session {id} discarded");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session {id}")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Editing and navigation
// ────────────────────────────────────────────────────────────────────────────

/// PATCH /api/v1/sessions/:id/fields
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(edit): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.update_field(edit);
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/next
///
/// A blocked transition answers 422 with the validation report.
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    match session.next() {
        Transition::Blocked { report } => Err(AppError::Invalid {
            message: "fix the highlighted fields before continuing".to_string(),
            report,
        }),
        transition => Ok(Json(TransitionResponse {
            transition,
            session: session.view(),
        })),
    }
}

/// POST /api/v1/sessions/:id/prev
pub async fn handle_prev(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let transition = session.prev();
    Ok(Json(TransitionResponse {
        transition,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/goto
pub async fn handle_go_to(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GoToRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let step: Step = session.go_to(req.step)?;
    tracing::debug!("session {id} jumped to step {}", step.number());
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/sections
pub async fn handle_select_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectSectionRequest>,
) -> Result<Json<SelectSectionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let added = session.select_section(req.section);
    Ok(Json(SelectSectionResponse {
        added,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/sections/:section/open
pub async fn handle_open_section(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, String)>,
) -> Result<Json<SessionView>, AppError> {
    let section = SectionId::parse(&section)
        .ok_or_else(|| AppError::Validation(format!("unknown section '{section}'")))?;
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.open_section(section)?;
    Ok(Json(session.view()))
}

/// PUT /api/v1/sessions/:id/template
///
/// Unknown template ids fall back to the default template.
pub async fn handle_set_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTemplateRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.update_field(FieldUpdate::Template(TemplateRef {
        id: req.id,
        name: req.name.unwrap_or_default(),
    }));
    Ok(Json(session.view()))
}

/// GET /api/v1/sessions/:id/validation
pub async fn handle_validation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ValidationReport>, AppError> {
    let session = find_session(&state, id).await?;
    let report = session.lock().await.validation();
    Ok(Json(report))
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Html<String>, AppError> {
    if let Some(template) = query.template.as_deref() {
        if registry::find(template).is_none() {
            warn!("preview requested for unknown template '{template}', using default");
        }
    }
    let session = find_session(&state, id).await?;
    let html = session.lock().await.preview(query.template.as_deref());
    Ok(Html(html.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Submit flow
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<SubmitRequest>>,
) -> Result<Json<SubmitResponse>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let validation = session.begin_submit(req.save_anyway)?;
    Ok(Json(SubmitResponse {
        submit_stage: session.submit_stage(),
        scroll_locked: session.scroll_locked(),
        validation,
    }))
}

/// POST /api/v1/sessions/:id/submit/confirm
pub async fn handle_submit_confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.confirm_submit()?;
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/submit/name
///
/// Creates the document when it has no id yet, updates it otherwise. The
/// session lock is released during the backend call; the in-flight stage
/// refuses concurrent submits meanwhile.
pub async fn handle_submit_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NameRequest>,
) -> Result<Json<SessionView>, AppError> {
    let shared = find_session(&state, id).await?;
    let request = shared.lock().await.begin_persist(&req.title)?;

    let outcome = match request.document_id.as_deref() {
        Some(doc_id) => {
            state
                .gateway
                .update(request.kind, doc_id, &request.payload)
                .await
        }
        None => state.gateway.create(request.kind, &request.payload).await,
    };
    match &outcome {
        Err(e) if e.is_unrecoverable() => {
            error!("session {id} save refused, retrying will not help: {e}")
        }
        Err(e) => warn!("session {id} save failed: {e}"),
        Ok(_) => {}
    }

    let mut session = shared.lock().await;
    session.finish_persist(&request, outcome)?;
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/submit/cancel
pub async fn handle_submit_cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    if !session.cancel_submit() {
        return Err(AppError::Conflict("no submit dialog is open".to_string()));
    }
    Ok(Json(session.view()))
}

/// DELETE /api/v1/sessions/:id/document
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let shared = find_session(&state, id).await?;
    let (kind, doc_id) = {
        let session = shared.lock().await;
        let document = session.document();
        let doc_id = document.id.clone().ok_or_else(|| {
            AppError::UnprocessableEntity("document has not been saved yet".to_string())
        })?;
        (document.kind, doc_id)
    };

    state.gateway.delete(kind, &doc_id).await?;
    info!("session {id} deleted {} {doc_id}", kind.resource());

    let mut session = shared.lock().await;
    session.forget_document_id();
    Ok(Json(session.view()))
}
