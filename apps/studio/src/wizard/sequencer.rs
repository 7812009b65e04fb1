//! Step sequencer: the finite state machine behind the wizard.
//!
//! Seven ordered steps. Step 6 (additional sections) carries an optional
//! sub-state: `None` is the section picker, `Some(id)` is an open section.
//! `max_step_reached` only ever grows.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::document::model::Document;
use crate::wizard::validation::{validate_required, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    Personal = 1,
    Summary = 2,
    Experience = 3,
    Education = 4,
    Skills = 5,
    AdditionalSections = 6,
    Review = 7,
}

impl Step {
    pub const FIRST: Step = Step::Personal;
    pub const LAST: Step = Step::Review;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::Personal),
            2 => Some(Step::Summary),
            3 => Some(Step::Experience),
            4 => Some(Step::Education),
            5 => Some(Step::Skills),
            6 => Some(Step::AdditionalSections),
            7 => Some(Step::Review),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Personal => "Personal Information",
            Step::Summary => "Professional Summary",
            Step::Experience => "Work Experience",
            Step::Education => "Education",
            Step::Skills => "Skills",
            Step::AdditionalSections => "Additional Sections",
            Step::Review => "Review",
        }
    }

    fn succ(self) -> Step {
        Step::from_number(self.number() + 1).unwrap_or(Step::LAST)
    }

    fn pred(self) -> Step {
        Step::from_number(self.number().saturating_sub(1)).unwrap_or(Step::FIRST)
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = WizardError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Step::from_number(n).ok_or(WizardError::StepOutOfRange(n))
    }
}

/// Sections offered by the step-6 picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionId {
    Certifications,
    Projects,
    Languages,
    Activities,
    AdditionalInfo,
    CustomFields,
}

impl SectionId {
    pub const ALL: [SectionId; 6] = [
        SectionId::Certifications,
        SectionId::Projects,
        SectionId::Languages,
        SectionId::Activities,
        SectionId::AdditionalInfo,
        SectionId::CustomFields,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Certifications => "certifications",
            SectionId::Projects => "projects",
            SectionId::Languages => "languages",
            SectionId::Activities => "activities",
            SectionId::AdditionalInfo => "additionalInfo",
            SectionId::CustomFields => "customFields",
        }
    }

    pub fn parse(s: &str) -> Option<SectionId> {
        SectionId::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// Whether the document already holds content for this section.
    pub fn has_content(&self, doc: &Document) -> bool {
        match self {
            SectionId::Certifications => !doc.certifications.is_empty(),
            SectionId::Projects => !doc.projects.is_empty(),
            SectionId::Languages => !doc.languages.is_empty(),
            SectionId::Activities => !doc.activities.is_empty(),
            SectionId::AdditionalInfo => !doc.additional_info.is_empty(),
            SectionId::CustomFields => !doc.custom_fields.is_empty(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("step {0} is out of range (1-7)")]
    StepOutOfRange(u8),

    #[error("sections can only be opened from the additional sections step (currently at step {0})")]
    NotAtSectionPicker(u8),

    #[error("section '{0}' has not been selected")]
    SectionNotSelected(&'static str),
}

/// What a `next`/`prev` call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    Moved { from: Step, to: Step },
    /// `next` inside an open section: the section is marked complete and closed.
    SectionCompleted { section: SectionId },
    /// `prev` inside an open section: back to the picker.
    SectionClosed { section: SectionId },
    /// Already at the boundary; nothing changed.
    Stayed { step: Step },
    /// Step-1 validation failed; nothing changed.
    Blocked { report: ValidationReport },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequencer {
    step: Step,
    sub_section: Option<SectionId>,
    max_step_reached: Step,
    selected_sections: Vec<SectionId>,
    completed_sections: Vec<SectionId>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            step: Step::FIRST,
            sub_section: None,
            max_step_reached: Step::FIRST,
            selected_sections: Vec::new(),
            completed_sections: Vec::new(),
        }
    }

    /// A sequencer for an existing document: sections that already hold
    /// content are pre-selected so the picker shows them.
    pub fn for_document(document: &Document) -> Self {
        let mut sequencer = Self::new();
        for id in SectionId::ALL {
            if id.has_content(document) {
                sequencer.selected_sections.push(id);
            }
        }
        sequencer
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn sub_section(&self) -> Option<SectionId> {
        self.sub_section
    }

    pub fn max_step_reached(&self) -> Step {
        self.max_step_reached
    }

    pub fn selected_sections(&self) -> &[SectionId] {
        &self.selected_sections
    }

    pub fn completed_sections(&self) -> &[SectionId] {
        &self.completed_sections
    }

    pub fn is_at_review(&self) -> bool {
        self.step == Step::Review
    }

    fn enter(&mut self, step: Step) {
        self.step = step;
        self.max_step_reached = self.max_step_reached.max(step);
    }

    /// Jumps directly to `step`, closing any open section first.
    pub fn go_to(&mut self, step: u8) -> Result<Step, WizardError> {
        let target = Step::try_from(step)?;
        self.sub_section = None;
        self.enter(target);
        debug!("wizard jumped to step {}", target.number());
        Ok(target)
    }

    pub fn next(&mut self, document: &Document) -> Transition {
        if self.step == Step::Personal {
            let report = validate_required(document);
            if !report.valid {
                debug!(
                    "wizard blocked at step 1: {} field error(s)",
                    report.errors.len()
                );
                return Transition::Blocked { report };
            }
        }

        if let Some(section) = self.sub_section.take() {
            if !self.completed_sections.contains(&section) {
                self.completed_sections.push(section);
            }
            return Transition::SectionCompleted { section };
        }

        let from = self.step;
        if from == Step::LAST {
            return Transition::Stayed { step: from };
        }
        let to = from.succ();
        self.enter(to);
        Transition::Moved { from, to }
    }

    pub fn prev(&mut self) -> Transition {
        if let Some(section) = self.sub_section.take() {
            return Transition::SectionClosed { section };
        }

        let from = self.step;
        if from == Step::FIRST {
            return Transition::Stayed { step: from };
        }
        let to = from.pred();
        self.enter(to);
        Transition::Moved { from, to }
    }

    /// Adds a section to the picker. Returns false if it was already selected.
    ///
    /// Document containers for every section always exist, so no document
    /// change is needed here.
    pub fn select_section(&mut self, id: SectionId) -> bool {
        if self.selected_sections.contains(&id) {
            return false;
        }
        self.selected_sections.push(id);
        true
    }

    /// Opens a selected section from the step-6 picker.
    pub fn open_section(&mut self, id: SectionId) -> Result<(), WizardError> {
        if self.step != Step::AdditionalSections {
            return Err(WizardError::NotAtSectionPicker(self.step.number()));
        }
        if !self.selected_sections.contains(&id) {
            return Err(WizardError::SectionNotSelected(id.as_str()));
        }
        self.sub_section = Some(id);
        Ok(())
    }
}
