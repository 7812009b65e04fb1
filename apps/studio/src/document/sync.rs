//! Field synchronizer: every document edit goes through here.
//!
//! Paired fields are described by `SYNC_PAIRS`. Editing either side of a pair
//! rebuilds the other so both stay the same length and order.
//!
//! The two merge strategies are deliberately different:
//! - `CarryRelevance` keeps the score of every element that still matches an
//!   existing matched entry by value, and gives new elements `DEFAULT_RELEVANCE`.
//! - `MirrorReplace` (experience only) copies the whole canonical list across,
//!   discarding any scores that were there before.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::model::{
    ActivityEntry, AdditionalInfo, CertificationEntry, CustomField, Document, EducationEntry,
    ExperienceEntry, LanguageEntry, MatchKey, MatchedSkill, Paired, PersonalInfo, ProjectEntry,
    Scored, TemplateRef, DEFAULT_RELEVANCE,
};
use crate::templates::registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    PersonalInfo,
    Summary,
    Education,
    Experience,
    Projects,
    Certifications,
    Languages,
    Activities,
    Skills,
    MatchedSkills,
    MatchedExperience,
    MatchedProjects,
    MatchedCertifications,
    MatchedLanguages,
    AdditionalInfo,
    CustomFields,
    Template,
    RoleApply,
}

/// A typed edit: the field name plus a value of that field's container shape.
///
/// On the wire: `{"field": "skills", "value": ["Go", "Rust"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldUpdate {
    Title(Option<String>),
    PersonalInfo(PersonalInfo),
    Summary(String),
    Education(Vec<EducationEntry>),
    Experience(Vec<ExperienceEntry>),
    Projects(Vec<ProjectEntry>),
    Certifications(Vec<CertificationEntry>),
    Languages(Vec<LanguageEntry>),
    Activities(Vec<ActivityEntry>),
    Skills(Vec<String>),
    MatchedSkills(Vec<MatchedSkill>),
    MatchedExperience(Vec<Scored<ExperienceEntry>>),
    MatchedProjects(Vec<Scored<ProjectEntry>>),
    MatchedCertifications(Vec<Scored<CertificationEntry>>),
    MatchedLanguages(Vec<Scored<LanguageEntry>>),
    AdditionalInfo(AdditionalInfo),
    CustomFields(Vec<CustomField>),
    Template(TemplateRef),
    RoleApply(Option<String>),
}

impl FieldUpdate {
    pub fn field(&self) -> Field {
        match self {
            FieldUpdate::Title(_) => Field::Title,
            FieldUpdate::PersonalInfo(_) => Field::PersonalInfo,
            FieldUpdate::Summary(_) => Field::Summary,
            FieldUpdate::Education(_) => Field::Education,
            FieldUpdate::Experience(_) => Field::Experience,
            FieldUpdate::Projects(_) => Field::Projects,
            FieldUpdate::Certifications(_) => Field::Certifications,
            FieldUpdate::Languages(_) => Field::Languages,
            FieldUpdate::Activities(_) => Field::Activities,
            FieldUpdate::Skills(_) => Field::Skills,
            FieldUpdate::MatchedSkills(_) => Field::MatchedSkills,
            FieldUpdate::MatchedExperience(_) => Field::MatchedExperience,
            FieldUpdate::MatchedProjects(_) => Field::MatchedProjects,
            FieldUpdate::MatchedCertifications(_) => Field::MatchedCertifications,
            FieldUpdate::MatchedLanguages(_) => Field::MatchedLanguages,
            FieldUpdate::AdditionalInfo(_) => Field::AdditionalInfo,
            FieldUpdate::CustomFields(_) => Field::CustomFields,
            FieldUpdate::Template(_) => Field::Template,
            FieldUpdate::RoleApply(_) => Field::RoleApply,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    CarryRelevance,
    MirrorReplace,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncPair {
    pub canonical: Field,
    pub matched: Field,
    pub strategy: MergeStrategy,
}

pub const SYNC_PAIRS: &[SyncPair] = &[
    SyncPair {
        canonical: Field::Skills,
        matched: Field::MatchedSkills,
        strategy: MergeStrategy::CarryRelevance,
    },
    SyncPair {
        canonical: Field::Experience,
        matched: Field::MatchedExperience,
        strategy: MergeStrategy::MirrorReplace,
    },
    SyncPair {
        canonical: Field::Projects,
        matched: Field::MatchedProjects,
        strategy: MergeStrategy::CarryRelevance,
    },
    SyncPair {
        canonical: Field::Certifications,
        matched: Field::MatchedCertifications,
        strategy: MergeStrategy::CarryRelevance,
    },
    SyncPair {
        canonical: Field::Languages,
        matched: Field::MatchedLanguages,
        strategy: MergeStrategy::CarryRelevance,
    },
];

/// Looks up the pair a field belongs to, from either side.
pub fn pair_for(field: Field) -> Option<&'static SyncPair> {
    SYNC_PAIRS
        .iter()
        .find(|p| p.canonical == field || p.matched == field)
}

/// Applies one edit and returns the new document. The input is never mutated.
pub fn update(document: &Document, edit: FieldUpdate) -> Document {
    let field = edit.field();
    let mut next = document.clone();
    apply(&mut next, edit);

    if let Some(pair) = pair_for(field) {
        if field == pair.canonical {
            rebuild_matched(&mut next, pair);
        } else {
            rebuild_canonical(&mut next, pair);
        }
    }

    next
}

fn apply(doc: &mut Document, edit: FieldUpdate) {
    match edit {
        FieldUpdate::Title(title) => doc.title = title.filter(|t| !t.trim().is_empty()),
        FieldUpdate::PersonalInfo(info) => doc.personal_info = info,
        FieldUpdate::Summary(summary) => doc.summary = summary,
        FieldUpdate::Education(v) => doc.education = v,
        FieldUpdate::Experience(v) => doc.experience = v,
        FieldUpdate::Projects(v) => doc.projects = v,
        FieldUpdate::Certifications(v) => doc.certifications = v,
        FieldUpdate::Languages(v) => doc.languages = v,
        FieldUpdate::Activities(v) => doc.activities = v,
        FieldUpdate::Skills(v) => doc.skills = v,
        FieldUpdate::MatchedSkills(v) => doc.matched_skills = v,
        FieldUpdate::MatchedExperience(v) => doc.matched_experience = v,
        FieldUpdate::MatchedProjects(v) => doc.matched_projects = v,
        FieldUpdate::MatchedCertifications(v) => doc.matched_certifications = v,
        FieldUpdate::MatchedLanguages(v) => doc.matched_languages = v,
        FieldUpdate::AdditionalInfo(info) => doc.additional_info = info,
        FieldUpdate::CustomFields(v) => doc.custom_fields = v,
        FieldUpdate::Template(template) => doc.template = registry::normalize(&template),
        FieldUpdate::RoleApply(role) => apply_role(doc, role),
    }
}

/// Sets the target role and moves the displayed headline with it.
///
/// A headline the user wrote is remembered when the override replaces it, so
/// clearing the role or saving puts it back.
fn apply_role(doc: &mut Document, role: Option<String>) {
    let previous = doc.headline_override().map(str::to_string);
    doc.role_apply = role;

    let showing_override = previous
        .as_deref()
        .is_some_and(|p| doc.personal_info.professional_headline.trim() == p);

    match doc.headline_override().map(str::to_string) {
        Some(role) => {
            if !showing_override {
                doc.headline_before_override =
                    Some(doc.personal_info.professional_headline.clone());
            }
            doc.personal_info.professional_headline = role;
        }
        None if showing_override => {
            doc.personal_info.professional_headline = doc.user_headline().to_string();
            doc.headline_before_override = None;
        }
        None => doc.headline_before_override = None,
    }
}

fn rebuild_matched(doc: &mut Document, pair: &SyncPair) {
    let strategy = pair.strategy;
    match pair.canonical {
        Field::Skills => doc.matched_skills = merge(&doc.skills, &doc.matched_skills, strategy),
        Field::Experience => {
            doc.matched_experience = merge(&doc.experience, &doc.matched_experience, strategy)
        }
        Field::Projects => {
            doc.matched_projects = merge(&doc.projects, &doc.matched_projects, strategy)
        }
        Field::Certifications => {
            doc.matched_certifications =
                merge(&doc.certifications, &doc.matched_certifications, strategy)
        }
        Field::Languages => {
            doc.matched_languages = merge(&doc.languages, &doc.matched_languages, strategy)
        }
        _ => {}
    }
}

fn rebuild_canonical(doc: &mut Document, pair: &SyncPair) {
    match pair.matched {
        Field::MatchedSkills => doc.skills = project(&doc.matched_skills),
        Field::MatchedExperience => doc.experience = project(&doc.matched_experience),
        Field::MatchedProjects => doc.projects = project(&doc.matched_projects),
        Field::MatchedCertifications => doc.certifications = project(&doc.matched_certifications),
        Field::MatchedLanguages => doc.languages = project(&doc.matched_languages),
        _ => {}
    }
}

pub fn merge<P: Paired>(canonical: &[P::Item], previous: &[P], strategy: MergeStrategy) -> Vec<P> {
    match strategy {
        MergeStrategy::CarryRelevance => carry_relevance(canonical, previous),
        MergeStrategy::MirrorReplace => canonical.iter().cloned().map(P::wrap_default).collect(),
    }
}

/// Rebuilds a matched view for `canonical`, reusing scores by value equality.
///
/// When `previous` holds several entries with the same key, the first one wins.
pub fn carry_relevance<P: Paired>(canonical: &[P::Item], previous: &[P]) -> Vec<P> {
    let mut scored: HashMap<String, &P> = HashMap::with_capacity(previous.len());
    for entry in previous {
        scored.entry(entry.item().match_key()).or_insert(entry);
    }

    canonical
        .iter()
        .map(|item| match scored.get(&item.match_key()) {
            Some(prev) => P::wrap(
                item.clone(),
                prev.relevance(),
                prev.comment().map(str::to_string),
            ),
            None => P::wrap(item.clone(), DEFAULT_RELEVANCE, None),
        })
        .collect()
}

/// Strips the scored wrapper from every matched entry.
pub fn project<P: Paired>(matched: &[P]) -> Vec<P::Item> {
    matched.iter().map(|m| m.item().clone()).collect()
}
