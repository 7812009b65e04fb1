use serde::{Deserialize, Serialize};

use crate::document::model::Document;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Complete,
    Partial,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionScore {
    pub section: String,
    pub score: u32,
    pub max: u32,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// 0–100
    pub overall_score: u32,
    pub sections: Vec<SectionScore>,
    pub missing_sections: Vec<String>,
}

const SUMMARY_FULL_LENGTH: usize = 100;
const SKILLS_FULL_COUNT: usize = 5;

fn section(name: &str, score: u32, max: u32, recommendations: Vec<String>) -> SectionScore {
    let status = match score {
        0 => SectionStatus::Missing,
        s if s >= max => SectionStatus::Complete,
        _ => SectionStatus::Partial,
    };
    SectionScore {
        section: name.to_string(),
        score: score.min(max),
        max,
        status,
        recommendations,
    }
}

fn personal_info(doc: &Document) -> SectionScore {
    let info = &doc.personal_info;
    let checks = [
        (!info.full_name().is_empty(), "Add your full name"),
        (!info.email.trim().is_empty(), "Add an email address"),
        (!info.phone.trim().is_empty(), "Add a phone number"),
        (
            !info.professional_headline.trim().is_empty(),
            "Add a professional headline",
        ),
        (!info.location.trim().is_empty(), "Add your location"),
    ];
    let score = checks.iter().filter(|(ok, _)| *ok).count() as u32 * 4;
    let recommendations = checks
        .iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, hint)| hint.to_string())
        .collect();
    section("personal_info", score, 20, recommendations)
}

fn summary(doc: &Document) -> SectionScore {
    let len = doc.summary.trim().chars().count();
    let (score, recommendations) = match len {
        0 => (0, vec!["Write a short professional summary".to_string()]),
        n if n < SUMMARY_FULL_LENGTH => (
            8,
            vec![format!(
                "Expand your summary to at least {SUMMARY_FULL_LENGTH} characters"
            )],
        ),
        _ => (15, vec![]),
    };
    section("summary", score, 15, recommendations)
}

fn experience(doc: &Document) -> SectionScore {
    let (score, recommendations) = match doc.experience.len() {
        0 => (0, vec!["Add at least one work experience entry".to_string()]),
        1 => (
            15,
            vec!["Add more experience entries to build a complete picture".to_string()],
        ),
        _ => (25, vec![]),
    };
    section("experience", score, 25, recommendations)
}

fn education(doc: &Document) -> SectionScore {
    if doc.education.is_empty() {
        section(
            "education",
            0,
            15,
            vec!["Add your education background".to_string()],
        )
    } else {
        section("education", 15, 15, vec![])
    }
}

fn skills(doc: &Document) -> SectionScore {
    let count = doc.skills.iter().filter(|s| !s.trim().is_empty()).count();
    let score = if count >= SKILLS_FULL_COUNT {
        15
    } else {
        count as u32 * 3
    };
    let recommendations = if count < SKILLS_FULL_COUNT {
        vec![format!("List at least {SKILLS_FULL_COUNT} skills ({count} so far)")]
    } else {
        vec![]
    };
    section("skills", score, 15, recommendations)
}

fn additional(doc: &Document) -> SectionScore {
    let filled = [
        !doc.projects.is_empty(),
        !doc.certifications.is_empty(),
        !doc.languages.is_empty(),
        !doc.activities.is_empty(),
        !doc.additional_info.is_empty(),
    ]
    .iter()
    .filter(|f| **f)
    .count() as u32;
    let recommendations = if filled < 5 {
        vec!["Projects, certifications or languages help you stand out".to_string()]
    } else {
        vec![]
    };
    section("additional_sections", filled * 2, 10, recommendations)
}

/// Fixed weighted sum over presence and length checks. Weights add up to 100.
pub fn compute_completeness(doc: &Document) -> CompletenessReport {
    let sections = vec![
        personal_info(doc),
        summary(doc),
        experience(doc),
        education(doc),
        skills(doc),
        additional(doc),
    ];

    let overall_score = sections.iter().map(|s| s.score).sum::<u32>().min(100);
    let missing_sections = sections
        .iter()
        .filter(|s| s.status == SectionStatus::Missing)
        .map(|s| s.section.clone())
        .collect();

    CompletenessReport {
        overall_score,
        sections,
        missing_sections,
    }
}
