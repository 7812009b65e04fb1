//! One in-progress editing session: the document, the step sequencer, the
//! submit flow and the preview cache.
//!
//! The document is copy-on-write: every edit produces a new `Arc<Document>`
//! and bumps `revision`, which is also the preview cache key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::hydrate::hydrate_value;
use crate::document::model::{Document, DocumentKind};
use crate::document::sync::{self, FieldUpdate};
use crate::gateway::{supersede, GatewayError};
use crate::templates::registry;
use crate::templates::render::PreviewCache;
use crate::wizard::completeness::{compute_completeness, CompletenessReport};
use crate::wizard::modal::{ModalGuard, ModalKind, ScrollLock};
use crate::wizard::sequencer::{SectionId, Sequencer, Step, Transition, WizardError};
use crate::wizard::validation::{validate_required, ValidationReport};

// ────────────────────────────────────────────────────────────────────────────
// Submit flow
// ────────────────────────────────────────────────────────────────────────────

/// validate → confirmation modal → naming prompt → persist.
#[derive(Debug)]
enum SubmitStage {
    Idle,
    Confirming(ModalGuard),
    Naming(ModalGuard),
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStageName {
    Idle,
    Confirming,
    Naming,
    InFlight,
}

impl SubmitStage {
    fn name(&self) -> SubmitStageName {
        match self {
            SubmitStage::Idle => SubmitStageName::Idle,
            SubmitStage::Confirming(_) => SubmitStageName::Confirming,
            SubmitStage::Naming(_) => SubmitStageName::Naming,
            SubmitStage::InFlight => SubmitStageName::InFlight,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submit is only available from the review step")]
    NotAtReview,

    #[error("a save is already in progress")]
    InFlight,

    #[error("submit flow is {current:?}, expected {expected:?}")]
    UnexpectedStage {
        current: SubmitStageName,
        expected: SubmitStageName,
    },

    #[error("required fields are missing or invalid")]
    Invalid(ValidationReport),

    #[error("recommended fields are empty; resubmit with saveAnyway to continue")]
    NeedsOverride(ValidationReport),

    #[error("a title is required to save the document")]
    MissingTitle,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Everything the gateway call needs, detached from the session lock.
#[derive(Debug, Clone)]
pub struct PersistRequest {
    pub kind: DocumentKind,
    pub document_id: Option<String>,
    pub payload: Value,
    /// Session revision the payload was taken from.
    pub revision: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct EditingSession {
    id: Uuid,
    document: Arc<Document>,
    revision: u64,
    sequencer: Sequencer,
    stage: SubmitStage,
    scroll_lock: ScrollLock,
    preview: PreviewCache,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub revision: u64,
    pub document: Document,
    pub step: Step,
    pub step_title: &'static str,
    pub sub_section: Option<SectionId>,
    pub max_step_reached: Step,
    pub selected_sections: Vec<SectionId>,
    pub completed_sections: Vec<SectionId>,
    pub submit_stage: SubmitStageName,
    pub scroll_locked: bool,
    pub completeness: CompletenessReport,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EditingSession {
    pub fn new(document: Document) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sequencer: Sequencer::for_document(&document),
            document: Arc::new(document),
            revision: 1,
            stage: SubmitStage::Idle,
            scroll_lock: ScrollLock::default(),
            preview: PreviewCache::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    #[cfg(test)]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[cfg(test)]
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn submit_stage(&self) -> SubmitStageName {
        self.stage.name()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_lock.is_locked()
    }

    fn open_modal(&self, kind: ModalKind) -> ModalGuard {
        let guard = self.scroll_lock.acquire(kind);
        debug!("session {} opened {:?}", self.id, guard.kind());
        guard
    }

    fn replace_document(&mut self, document: Document) {
        self.document = Arc::new(document);
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    /// Routes an edit through the field synchronizer.
    pub fn update_field(&mut self, edit: FieldUpdate) -> u64 {
        let field = edit.field();
        let next = sync::update(&self.document, edit);
        self.replace_document(next);
        debug!(
            "session {} updated {:?} (revision {})",
            self.id, field, self.revision
        );
        self.revision
    }

    pub fn next(&mut self) -> Transition {
        let transition = self.sequencer.next(&self.document);
        if let Transition::Blocked { report } = &transition {
            warn!(
                "session {} blocked at step 1 ({} errors)",
                self.id,
                report.errors.len()
            );
        }
        self.updated_at = Utc::now();
        transition
    }

    pub fn prev(&mut self) -> Transition {
        self.updated_at = Utc::now();
        self.sequencer.prev()
    }

    pub fn go_to(&mut self, step: u8) -> Result<Step, WizardError> {
        self.updated_at = Utc::now();
        self.sequencer.go_to(step)
    }

    pub fn select_section(&mut self, id: SectionId) -> bool {
        self.sequencer.select_section(id)
    }

    pub fn open_section(&mut self, id: SectionId) -> Result<(), WizardError> {
        self.sequencer.open_section(id)
    }

    pub fn validation(&self) -> ValidationReport {
        validate_required(&self.document)
    }

    pub fn completeness(&self) -> CompletenessReport {
        compute_completeness(&self.document)
    }

    /// Rendered HTML for `template`, or the document's own template.
    pub fn preview(&mut self, template: Option<&str>) -> Arc<str> {
        let id = template.unwrap_or(self.document.template.id.as_str());
        let entry = registry::resolve(Some(id));
        self.preview
            .get_or_render(self.revision, &self.document, entry)
    }

    pub fn begin_submit(&mut self, save_anyway: bool) -> Result<ValidationReport, SubmitError> {
        match self.stage {
            SubmitStage::InFlight => return Err(SubmitError::InFlight),
            SubmitStage::Idle => {}
            ref other => {
                return Err(SubmitError::UnexpectedStage {
                    current: other.name(),
                    expected: SubmitStageName::Idle,
                })
            }
        }
        if !self.sequencer.is_at_review() {
            return Err(SubmitError::NotAtReview);
        }

        let report = validate_required(&self.document);
        if !report.valid {
            return Err(SubmitError::Invalid(report));
        }
        if report.has_warnings() && !save_anyway {
            return Err(SubmitError::NeedsOverride(report));
        }

        self.stage = SubmitStage::Confirming(self.open_modal(ModalKind::SubmitConfirmation));
        Ok(report)
    }

    pub fn confirm_submit(&mut self) -> Result<(), SubmitError> {
        match self.stage {
            SubmitStage::Confirming(_) => {
                // The confirmation guard drops as the prompt's guard replaces it.
                self.stage = SubmitStage::Naming(self.open_modal(ModalKind::NamePrompt));
                Ok(())
            }
            ref other => Err(SubmitError::UnexpectedStage {
                current: other.name(),
                expected: SubmitStageName::Confirming,
            }),
        }
    }

    /// Applies the chosen title and marks the save in flight.
    pub fn begin_persist(&mut self, title: &str) -> Result<PersistRequest, SubmitError> {
        match self.stage {
            SubmitStage::Naming(_) => {}
            SubmitStage::InFlight => return Err(SubmitError::InFlight),
            ref other => {
                return Err(SubmitError::UnexpectedStage {
                    current: other.name(),
                    expected: SubmitStageName::Naming,
                })
            }
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(SubmitError::MissingTitle);
        }

        self.update_field(FieldUpdate::Title(Some(title.to_string())));
        self.stage = SubmitStage::InFlight;

        Ok(PersistRequest {
            kind: self.document.kind,
            document_id: self.document.id.clone(),
            payload: self.document.to_wire(),
            revision: self.revision,
        })
    }

    /// Settles an in-flight save.
    ///
    /// On success the document is superseded by the server's representation,
    /// unless it was edited while the save was in flight. In that case the
    /// edits are kept and only the saved id is adopted. On failure the document
    /// is left untouched. Either way the flow returns to idle so the user can
    /// retry.
    pub fn finish_persist(
        &mut self,
        request: &PersistRequest,
        outcome: Result<Value, GatewayError>,
    ) -> Result<(), SubmitError> {
        self.stage = SubmitStage::Idle;

        let returned = outcome?;
        let merged = supersede(&request.payload, Some(returned));
        let saved = hydrate_value(merged, request.kind);
        let saved_id = saved
            .id
            .clone()
            .or_else(|| self.document.id.clone())
            .or_else(|| request.document_id.clone());

        let document = if self.revision == request.revision {
            Document {
                id: saved_id,
                ..saved
            }
        } else {
            warn!(
                "session {} was edited while saving (revision {} -> {}); keeping local edits",
                self.id, request.revision, self.revision
            );
            Document {
                id: saved_id,
                ..(*self.document).clone()
            }
        };

        info!(
            "session {} saved {} {}",
            self.id,
            request.kind.resource(),
            document.id.as_deref().unwrap_or("<no id>")
        );
        self.replace_document(document);
        Ok(())
    }

    /// Closes whichever submit modal is open. Returns false if nothing was open.
    pub fn cancel_submit(&mut self) -> bool {
        match self.stage {
            SubmitStage::Confirming(_) | SubmitStage::Naming(_) => {
                self.stage = SubmitStage::Idle;
                true
            }
            _ => false,
        }
    }

    /// Marks the document as deleted on the backend.
    pub fn forget_document_id(&mut self) {
        let mut document = (*self.document).clone();
        document.id = None;
        self.replace_document(document);
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            kind: self.document.kind,
            revision: self.revision,
            document: (*self.document).clone(),
            step: self.sequencer.step(),
            step_title: self.sequencer.step().title(),
            sub_section: self.sequencer.sub_section(),
            max_step_reached: self.sequencer.max_step_reached(),
            selected_sections: self.sequencer.selected_sections().to_vec(),
            completed_sections: self.sequencer.completed_sections().to_vec(),
            submit_stage: self.stage.name(),
            scroll_locked: self.scroll_locked(),
            completeness: self.completeness(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::PersonalInfo;
    use serde_json::json;

    fn ready_session(headline: &str) -> EditingSession {
        let mut session = EditingSession::new(Document::new(DocumentKind::Cv));
        session.update_field(FieldUpdate::PersonalInfo(PersonalInfo {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@x.com".into(),
            professional_headline: headline.into(),
            ..Default::default()
        }));
        session.go_to(7).unwrap();
        session
    }

    #[test]
    fn test_update_bumps_revision_and_replaces_document() {
        let mut session = EditingSession::new(Document::new(DocumentKind::Cv));
        let before = Arc::clone(session.document());
        let rev = session.update_field(FieldUpdate::Skills(vec!["Go".into()]));
        assert_eq!(rev, 2);
        assert!(!Arc::ptr_eq(&before, session.document()));
        assert!(before.skills.is_empty());
        assert_eq!(session.document().matched_skills.len(), 1);
    }

    #[test]
    fn test_blocked_next_leaves_document_untouched() {
        let mut session = EditingSession::new(Document::new(DocumentKind::Cv));
        let rev = session.revision();
        assert!(matches!(session.next(), Transition::Blocked { .. }));
        assert_eq!(session.revision(), rev);
        assert_eq!(session.sequencer().step(), Step::Personal);
    }

    #[test]
    fn test_preview_is_memoised_per_revision() {
        let mut session = EditingSession::new(Document::new(DocumentKind::Cv));
        let a = session.preview(None);
        let b = session.preview(None);
        assert!(Arc::ptr_eq(&a, &b));
        session.update_field(FieldUpdate::Summary("Hello".into()));
        let c = session.preview(None);
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(c.contains("Hello"));
    }

    #[test]
    fn test_submit_requires_review_step() {
        let mut session = ready_session("Engineer");
        session.go_to(3).unwrap();
        assert!(matches!(session.begin_submit(false), Err(SubmitError::NotAtReview)));
    }

    #[test]
    fn test_submit_blocks_on_hard_errors_even_with_override() {
        let mut session = EditingSession::new(Document::new(DocumentKind::Cv));
        session.go_to(7).unwrap();
        assert!(matches!(session.begin_submit(true), Err(SubmitError::Invalid(_))));
        assert_eq!(session.submit_stage(), SubmitStageName::Idle);
    }

    #[test]
    fn test_missing_headline_needs_override() {
        let mut session = ready_session("");
        assert!(matches!(
            session.begin_submit(false),
            Err(SubmitError::NeedsOverride(_))
        ));
        assert!(session.begin_submit(true).is_ok());
        assert_eq!(session.submit_stage(), SubmitStageName::Confirming);
    }

    #[test]
    fn test_full_submit_flow_and_scroll_lock() {
        let mut session = ready_session("Engineer");
        assert!(!session.scroll_locked());

        session.begin_submit(false).unwrap();
        assert!(session.scroll_locked());

        session.confirm_submit().unwrap();
        assert_eq!(session.submit_stage(), SubmitStageName::Naming);
        assert_eq!(session.scroll_lock.holders(), 1);

        let request = session.begin_persist("  My CV ").unwrap();
        assert_eq!(session.submit_stage(), SubmitStageName::InFlight);
        assert!(!session.scroll_locked());
        assert_eq!(request.payload["title"], json!("My CV"));
        assert!(request.document_id.is_none());

        // Second submit while in flight is refused.
        assert!(matches!(session.begin_submit(true), Err(SubmitError::InFlight)));

        let returned = json!({"id": "cv-1"});
        session.finish_persist(&request, Ok(returned)).unwrap();
        assert_eq!(session.submit_stage(), SubmitStageName::Idle);
        assert_eq!(session.document().id.as_deref(), Some("cv-1"));
        assert_eq!(session.document().title.as_deref(), Some("My CV"));
        assert_eq!(session.document().personal_info.first_name, "Ann");
    }

    #[test]
    fn test_failed_persist_resets_flag_and_keeps_document() {
        let mut session = ready_session("Engineer");
        session.begin_submit(false).unwrap();
        session.confirm_submit().unwrap();
        let request = session.begin_persist("CV").unwrap();
        let before = Arc::clone(session.document());

        let err = session
            .finish_persist(&request, Err(GatewayError::Rejected("nope".into())))
            .unwrap_err();
        assert!(matches!(err, SubmitError::Gateway(_)));
        assert_eq!(session.submit_stage(), SubmitStageName::Idle);
        assert!(Arc::ptr_eq(&before, session.document()));
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut session = ready_session("Engineer");
        session.begin_submit(false).unwrap();
        session.confirm_submit().unwrap();
        assert!(matches!(session.begin_persist("  "), Err(SubmitError::MissingTitle)));
        assert_eq!(session.submit_stage(), SubmitStageName::Naming);
    }

    #[test]
    fn test_cancel_releases_lock() {
        let mut session = ready_session("Engineer");
        session.begin_submit(false).unwrap();
        assert!(session.cancel_submit());
        assert!(!session.scroll_locked());
        assert!(!session.cancel_submit());
    }

    #[test]
    fn test_confirm_out_of_order() {
        let mut session = ready_session("Engineer");
        assert!(matches!(
            session.confirm_submit(),
            Err(SubmitError::UnexpectedStage { .. })
        ));
    }

    #[test]
    fn test_resume_save_keeps_real_headline() {
        let doc = hydrate_value(
            json!({
                "personalInfo": {
                    "firstName": "Ann", "lastName": "Lee", "email": "ann@x.com",
                    "professionalHeadline": "Backend Engineer"
                },
                "roleApply": "Staff SRE"
            }),
            DocumentKind::Resume,
        );
        let mut session = EditingSession::new(doc);
        session.go_to(7).unwrap();
        session.begin_submit(false).unwrap();
        session.confirm_submit().unwrap();
        let request = session.begin_persist("Tailored").unwrap();
        assert_eq!(
            request.payload["personalInfo"]["professionalHeadline"],
            json!("Backend Engineer")
        );
    }

    #[test]
    fn test_headline_typed_in_session_survives_role_apply_on_save() {
        let mut session = EditingSession::new(Document::new(DocumentKind::Resume));
        session.update_field(FieldUpdate::PersonalInfo(PersonalInfo {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@x.com".into(),
            professional_headline: "Backend Engineer".into(),
            ..Default::default()
        }));
        session.update_field(FieldUpdate::RoleApply(Some("Staff SRE".into())));
        assert_eq!(
            session.document().personal_info.professional_headline,
            "Staff SRE"
        );

        session.go_to(7).unwrap();
        session.begin_submit(false).unwrap();
        session.confirm_submit().unwrap();
        let request = session.begin_persist("Tailored").unwrap();
        assert_eq!(
            request.payload["personalInfo"]["professionalHeadline"],
            json!("Backend Engineer")
        );
        assert_eq!(request.payload["roleApply"], json!("Staff SRE"));
    }

    #[test]
    fn test_edit_during_save_is_kept() {
        let mut session = ready_session("Engineer");
        session.begin_submit(false).unwrap();
        session.confirm_submit().unwrap();
        let request = session.begin_persist("Main CV").unwrap();

        session.update_field(FieldUpdate::Summary("typed while saving".into()));
        session
            .finish_persist(&request, Ok(json!({"id": "1"})))
            .unwrap();

        assert_eq!(session.document().summary, "typed while saving");
        assert_eq!(session.document().id.as_deref(), Some("1"));
        assert_eq!(session.document().title.as_deref(), Some("Main CV"));
        assert_eq!(session.submit_stage(), SubmitStageName::Idle);
    }
}
