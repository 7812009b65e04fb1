//! Hydration: turning a raw, possibly partial backend record into a full `Document`.
//!
//! Every optional field is defaulted exactly once here so that read sites never
//! need fallbacks. For each paired field set, whichever side is present fills
//! the other.
//!
//! Hydration never fails. Legacy field names are folded onto their canonical
//! name first, scalars of the wrong type degrade through the model's lenient
//! deserializers, and list elements that are not records are dropped with a
//! warning.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::document::model::{
    scalar_text, string_list, ActivityEntry, AdditionalInfo, CertificationEntry, CustomField,
    Document, DocumentKind, EducationEntry, ExperienceEntry, LanguageEntry, MatchedSkill, Paired,
    PersonalInfo, ProjectEntry, Scored, TemplateRef,
};
use crate::document::sync::{carry_relevance, project};
use crate::templates::registry;

/// Canonical key followed by the legacy names it may arrive under, in priority order.
type AliasTable = &'static [(&'static str, &'static [&'static str])];

const DOCUMENT_ALIASES: AliasTable = &[
    ("id", &["_id"]),
    ("title", &["name", "cvName", "resumeName"]),
    ("summary", &["professionalSummary"]),
];
const PERSONAL_INFO_ALIASES: AliasTable = &[("professionalHeadline", &["headline", "jobTitle"])];
const EXPERIENCE_ALIASES: AliasTable = &[
    ("position", &["title", "role", "jobTitle"]),
    ("company", &["employer"]),
    ("current", &["isPresent", "currentlyWorking"]),
];
const EDUCATION_ALIASES: AliasTable = &[
    ("institution", &["school", "university"]),
    ("fieldOfStudy", &["field", "major"]),
    ("current", &["isPresent"]),
];
const PROJECT_ALIASES: AliasTable = &[
    ("name", &["title"]),
    ("technologies", &["techStack"]),
    ("url", &["link"]),
];
const CERTIFICATION_ALIASES: AliasTable = &[
    ("name", &["title"]),
    ("issuer", &["organization", "issuingOrganization"]),
    ("date", &["issueDate"]),
];
const LANGUAGE_ALIASES: AliasTable = &[("language", &["name"]), ("proficiency", &["level"])];
const ACTIVITY_ALIASES: AliasTable = &[("title", &["name", "role"])];
const SKILL_ALIASES: AliasTable = &[("skill", &["name"])];

/// A backend record as received. Every field may be missing.
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub personal_info: Option<PersonalInfo>,
    pub summary: Option<String>,
    pub education: Option<Vec<EducationEntry>>,
    pub experience: Option<Vec<ExperienceEntry>>,
    pub projects: Option<Vec<ProjectEntry>>,
    pub certifications: Option<Vec<CertificationEntry>>,
    pub languages: Option<Vec<LanguageEntry>>,
    pub activities: Option<Vec<ActivityEntry>>,
    pub skills: Option<Vec<String>>,
    pub matched_skills: Option<Vec<MatchedSkill>>,
    pub matched_experience: Option<Vec<Scored<ExperienceEntry>>>,
    pub matched_projects: Option<Vec<Scored<ProjectEntry>>>,
    pub matched_certifications: Option<Vec<Scored<CertificationEntry>>>,
    pub matched_languages: Option<Vec<Scored<LanguageEntry>>>,
    pub additional_info: Option<AdditionalInfo>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub template: Option<RawTemplate>,
    pub template_id: Option<String>,
    pub role_apply: Option<String>,
}

impl RawDocument {
    /// Picks every known field out of a JSON record. Anything unusable is left as `None`.
    pub fn from_value(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                warn!("Document record is not an object ({other}); hydrating an empty document");
                Map::new()
            }
        };
        canonicalize(&mut map, DOCUMENT_ALIASES);

        Self {
            id: map.remove("id").filter(|v| !v.is_null()),
            title: text(&mut map, "title"),
            personal_info: map
                .remove("personalInfo")
                .and_then(|v| record(v, PERSONAL_INFO_ALIASES, "personalInfo")),
            summary: text(&mut map, "summary"),
            education: records(&mut map, "education", EDUCATION_ALIASES),
            experience: records(&mut map, "experience", EXPERIENCE_ALIASES),
            projects: records(&mut map, "projects", PROJECT_ALIASES),
            certifications: records(&mut map, "certifications", CERTIFICATION_ALIASES),
            languages: records(&mut map, "languages", LANGUAGE_ALIASES),
            activities: records(&mut map, "activities", ACTIVITY_ALIASES),
            skills: map
                .remove("skills")
                .filter(|v| !v.is_null())
                .map(|v| string_list(Some(&v))),
            matched_skills: records(&mut map, "matchedSkills", SKILL_ALIASES),
            matched_experience: records(&mut map, "matchedExperience", EXPERIENCE_ALIASES),
            matched_projects: records(&mut map, "matchedProjects", PROJECT_ALIASES),
            matched_certifications: records(&mut map, "matchedCertifications", CERTIFICATION_ALIASES),
            matched_languages: records(&mut map, "matchedLanguages", LANGUAGE_ALIASES),
            additional_info: map
                .remove("additionalInfo")
                .and_then(|v| record(v, &[], "additionalInfo")),
            custom_fields: records(&mut map, "customFields", &[]),
            template: map.remove("template").and_then(RawTemplate::from_value),
            template_id: text(&mut map, "templateId"),
            role_apply: text(&mut map, "roleApply"),
        }
    }
}

/// Templates arrive either as a bare id or as `{id, name}`.
#[derive(Debug, Clone)]
pub enum RawTemplate {
    Id(String),
    Ref {
        id: Option<String>,
        name: Option<String>,
    },
}

impl RawTemplate {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(RawTemplate::Ref {
                id: map.get("id").and_then(scalar_text),
                name: map.get("name").and_then(scalar_text),
            }),
            other => scalar_text(&other).map(RawTemplate::Id),
        }
    }
}

/// Hydrates a JSON record of any shape.
pub fn hydrate_value(value: Value, kind: DocumentKind) -> Document {
    hydrate(RawDocument::from_value(value), kind)
}

pub fn hydrate(raw: RawDocument, kind: DocumentKind) -> Document {
    let (skills, matched_skills) = reconcile::<MatchedSkill>(raw.skills, raw.matched_skills);
    let (experience, matched_experience) =
        reconcile::<Scored<ExperienceEntry>>(raw.experience, raw.matched_experience);
    let (projects, matched_projects) =
        reconcile::<Scored<ProjectEntry>>(raw.projects, raw.matched_projects);
    let (certifications, matched_certifications) =
        reconcile::<Scored<CertificationEntry>>(raw.certifications, raw.matched_certifications);
    let (languages, matched_languages) =
        reconcile::<Scored<LanguageEntry>>(raw.languages, raw.matched_languages);

    let template = match (raw.template, raw.template_id) {
        (Some(RawTemplate::Id(id)), _) => TemplateRef {
            id,
            name: String::new(),
        },
        (Some(RawTemplate::Ref { id, name }), fallback) => TemplateRef {
            id: id.or(fallback).unwrap_or_default(),
            name: name.unwrap_or_default(),
        },
        (None, Some(id)) => TemplateRef {
            id,
            name: String::new(),
        },
        (None, None) => TemplateRef::default(),
    };

    let personal_info = raw.personal_info.unwrap_or_default();
    let role_apply = match kind {
        DocumentKind::Resume => raw.role_apply,
        DocumentKind::Cv => None,
    };

    let mut document = Document {
        kind,
        id: raw.id.as_ref().and_then(id_to_string),
        title: raw.title.filter(|t| !t.trim().is_empty()),
        original_personal_info: personal_info.clone(),
        personal_info,
        summary: raw.summary.unwrap_or_default(),
        education: raw.education.unwrap_or_default(),
        experience,
        projects,
        certifications,
        languages,
        activities: raw.activities.unwrap_or_default(),
        skills,
        matched_skills,
        matched_experience,
        matched_projects,
        matched_certifications,
        matched_languages,
        additional_info: raw.additional_info.unwrap_or_default(),
        custom_fields: raw.custom_fields.unwrap_or_default(),
        template: registry::normalize(&template),
        role_apply,
        headline_before_override: None,
    };

    if let Some(role) = document.headline_override().map(str::to_string) {
        document.personal_info.professional_headline = role;
    }

    document
}

/// Fills whichever side of a pair is missing from the other.
///
/// An empty list counts as missing. When both sides are present the matched
/// view is realigned to the canonical order.
fn reconcile<P: Paired>(
    canonical: Option<Vec<P::Item>>,
    matched: Option<Vec<P>>,
) -> (Vec<P::Item>, Vec<P>) {
    let canonical = canonical.filter(|c| !c.is_empty());
    let matched = matched.filter(|m| !m.is_empty());

    match (canonical, matched) {
        (Some(canonical), Some(matched)) => {
            let matched = carry_relevance(&canonical, &matched);
            (canonical, matched)
        }
        (Some(canonical), None) => {
            let matched = canonical.iter().cloned().map(P::wrap_default).collect();
            (canonical, matched)
        }
        (None, Some(matched)) => (project(&matched), matched),
        (None, None) => (Vec::new(), Vec::new()),
    }
}

/// Moves legacy keys onto their canonical name.
///
/// A non-null canonical value always wins; otherwise the first non-null alias
/// does. Alias keys are removed either way so they cannot collide later.
fn canonicalize(map: &mut Map<String, Value>, aliases: AliasTable) {
    for (canonical, names) in aliases {
        for name in *names {
            let Some(value) = map.remove(*name) else {
                continue;
            };
            if !value.is_null() && map.get(*canonical).map_or(true, Value::is_null) {
                map.insert((*canonical).to_string(), value);
            }
        }
    }
}

fn text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    map.remove(key).as_ref().and_then(scalar_text)
}

fn record<T: DeserializeOwned>(value: Value, aliases: AliasTable, field: &str) -> Option<T> {
    let mut map = match value {
        Value::Object(map) => map,
        Value::Null => return None,
        other => {
            warn!("Dropping {field} entry that is not a record: {other}");
            return None;
        }
    };
    canonicalize(&mut map, aliases);
    match serde_json::from_value(Value::Object(map)) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Dropping malformed {field} entry: {e}");
            None
        }
    }
}

fn records<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &str,
    aliases: AliasTable,
) -> Option<Vec<T>> {
    match map.remove(key)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| record(item, aliases, key))
                .collect(),
        ),
        Value::Null => None,
        other => {
            warn!("Ignoring {key}: expected a list, got {other}");
            None
        }
    }
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::DEFAULT_RELEVANCE;
    use serde_json::json;

    #[test]
    fn test_empty_record_hydrates_to_defaults() {
        let doc = hydrate_value(json!({}), DocumentKind::Cv);
        assert!(doc.skills.is_empty());
        assert!(doc.matched_skills.is_empty());
        assert!(doc.experience.is_empty());
        assert_eq!(doc.template.id, registry::DEFAULT_TEMPLATE_ID);
        assert!(doc.id.is_none());
    }

    #[test]
    fn test_only_matched_experience_fills_experience() {
        let raw = json!({
            "matchedExperience": [
                {"position": "Engineer", "company": "Acme", "relevance": 72, "comment": "strong"},
                {"position": "Intern", "company": "Beta", "relevance": 30}
            ]
        });
        let doc = hydrate_value(raw, DocumentKind::Resume);
        let projected: Vec<_> = doc.matched_experience.iter().map(|m| m.entry.clone()).collect();
        assert_eq!(doc.experience, projected);
        assert_eq!(doc.experience[0].position, "Engineer");
        assert_eq!(doc.matched_experience[0].relevance, 72);
    }

    #[test]
    fn test_only_skills_wraps_with_default_relevance() {
        let doc = hydrate_value(json!({"skills": ["Go", "Rust"]}), DocumentKind::Cv);
        assert_eq!(doc.matched_skills.len(), 2);
        assert!(doc
            .matched_skills
            .iter()
            .all(|m| m.relevance == DEFAULT_RELEVANCE));
        assert_eq!(doc.matched_skills[1].skill, "Rust");
    }

    #[test]
    fn test_only_matched_skills_projects_skill_names() {
        let raw = json!({"matchedSkills": [{"skill": "SQL", "relevance": 55}]});
        let doc = hydrate_value(raw, DocumentKind::Resume);
        assert_eq!(doc.skills, vec!["SQL".to_string()]);
    }

    #[test]
    fn test_both_sides_present_are_realigned() {
        let raw = json!({
            "skills": ["Rust", "Go"],
            "matchedSkills": [{"skill": "Go", "relevance": 40}, {"skill": "Perl", "relevance": 10}]
        });
        let doc = hydrate_value(raw, DocumentKind::Resume);
        let names: Vec<_> = doc.matched_skills.iter().map(|m| m.skill.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Go"]);
        assert_eq!(doc.matched_skills[0].relevance, DEFAULT_RELEVANCE);
        assert_eq!(doc.matched_skills[1].relevance, 40);
    }

    #[test]
    fn test_unknown_template_replaced_with_default() {
        let doc = hydrate_value(json!({"template": "does-not-exist"}), DocumentKind::Cv);
        assert_eq!(doc.template.id, registry::DEFAULT_TEMPLATE_ID);

        let doc = hydrate_value(json!({"template": {"id": "modern"}}), DocumentKind::Cv);
        assert_eq!(doc.template.id, "modern");
        assert_eq!(doc.template.name, "Modern");

        let doc = hydrate_value(json!({"templateId": "minimal"}), DocumentKind::Cv);
        assert_eq!(doc.template.id, "minimal");
    }

    #[test]
    fn test_role_apply_overrides_displayed_headline_only() {
        let raw = json!({
            "personalInfo": {"firstName": "Ann", "professionalHeadline": "Backend Engineer"},
            "roleApply": "Staff SRE"
        });
        let doc = hydrate_value(raw, DocumentKind::Resume);
        assert_eq!(doc.personal_info.professional_headline, "Staff SRE");
        assert_eq!(
            doc.original_personal_info.professional_headline,
            "Backend Engineer"
        );
    }

    #[test]
    fn test_role_apply_ignored_for_cv() {
        let raw = json!({
            "personalInfo": {"professionalHeadline": "Backend Engineer"},
            "roleApply": "Staff SRE"
        });
        let doc = hydrate_value(raw, DocumentKind::Cv);
        assert_eq!(doc.personal_info.professional_headline, "Backend Engineer");
        assert!(doc.role_apply.is_none());
    }

    #[test]
    fn test_numeric_and_mongo_style_ids() {
        let doc = hydrate_value(json!({"id": 42}), DocumentKind::Cv);
        assert_eq!(doc.id.as_deref(), Some("42"));
        let doc = hydrate_value(json!({"_id": "abc123"}), DocumentKind::Cv);
        assert_eq!(doc.id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_legacy_field_names_are_folded_in() {
        let raw = json!({
            "cvName": "Main CV",
            "professionalSummary": "Builds things",
            "personalInfo": {"headline": "Backend Engineer"},
            "experience": [{"title": "Engineer", "employer": "Acme", "isPresent": true}],
            "education": [{"school": "MIT", "major": "CS"}],
            "matchedSkills": [{"name": "Go", "relevance": 70}]
        });
        let doc = hydrate_value(raw, DocumentKind::Cv);
        assert_eq!(doc.title.as_deref(), Some("Main CV"));
        assert_eq!(doc.summary, "Builds things");
        assert_eq!(doc.personal_info.professional_headline, "Backend Engineer");
        assert_eq!(doc.experience[0].position, "Engineer");
        assert_eq!(doc.experience[0].company, "Acme");
        assert!(doc.experience[0].current);
        assert_eq!(doc.education[0].institution, "MIT");
        assert_eq!(doc.education[0].field_of_study, "CS");
        assert_eq!(doc.skills, vec!["Go".to_string()]);
    }

    #[test]
    fn test_numeric_gpa_is_kept_as_text() {
        let doc = hydrate_value(json!({"education": [{"gpa": 3.8}]}), DocumentKind::Cv);
        assert_eq!(doc.education.len(), 1);
        assert_eq!(doc.education[0].gpa, "3.8");
    }

    #[test]
    fn test_canonical_and_legacy_name_together() {
        let doc = hydrate_value(
            json!({"experience": [{"position": "Eng", "title": "Eng"}]}),
            DocumentKind::Resume,
        );
        assert_eq!(doc.experience.len(), 1);
        assert_eq!(doc.experience[0].position, "Eng");

        let doc = hydrate_value(
            json!({"experience": [{"position": null, "title": "Lead"}]}),
            DocumentKind::Resume,
        );
        assert_eq!(doc.experience[0].position, "Lead");
    }

    #[test]
    fn test_null_personal_fields_become_empty() {
        let doc = hydrate_value(
            json!({"personalInfo": {"firstName": "Ann", "phone": null}}),
            DocumentKind::Cv,
        );
        assert_eq!(doc.personal_info.first_name, "Ann");
        assert_eq!(doc.personal_info.phone, "");
    }

    #[test]
    fn test_wrongly_shaped_values_are_dropped() {
        let raw = json!({
            "title": 2024,
            "skills": "Rust, Go",
            "projects": [{"name": "Cli"}, "not a record", null],
            "languages": {"language": "French"},
            "roleApply": null
        });
        let doc = hydrate_value(raw, DocumentKind::Resume);
        assert_eq!(doc.title.as_deref(), Some("2024"));
        assert_eq!(doc.skills, vec!["Rust".to_string(), "Go".to_string()]);
        assert_eq!(doc.projects.len(), 1);
        assert!(doc.languages.is_empty());
        assert!(doc.role_apply.is_none());

        let doc = hydrate_value(json!("garbage"), DocumentKind::Cv);
        assert_eq!(doc.template.id, registry::DEFAULT_TEMPLATE_ID);
    }
}
