//! The registered template render functions.
//!
//! Every template is a `LayoutSpec` (section order, optional sidebar, badges)
//! fed through the same section builders, so templates differ only in data.

use crate::document::model::{Document, DocumentKind};
use crate::templates::render::{date_range, PreviewNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Languages,
    Activities,
    AdditionalInfo,
    CustomFields,
}

impl Section {
    fn heading(&self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::Experience => "Experience",
            Section::Education => "Education",
            Section::Skills => "Skills",
            Section::Projects => "Projects",
            Section::Certifications => "Certifications",
            Section::Languages => "Languages",
            Section::Activities => "Activities",
            Section::AdditionalInfo => "Additional Information",
            Section::CustomFields => "Details",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Certifications => "certifications",
            Section::Languages => "languages",
            Section::Activities => "activities",
            Section::AdditionalInfo => "additional-info",
            Section::CustomFields => "custom-fields",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutSpec {
    pub class: &'static str,
    pub main: &'static [Section],
    pub sidebar: &'static [Section],
    /// Show relevance badges on resumes produced by job matching.
    pub show_relevance: bool,
}

const STANDARD_ORDER: &[Section] = &[
    Section::Summary,
    Section::Experience,
    Section::Education,
    Section::Skills,
    Section::Projects,
    Section::Certifications,
    Section::Languages,
    Section::Activities,
    Section::AdditionalInfo,
    Section::CustomFields,
];

const CLASSIC: LayoutSpec = LayoutSpec {
    class: "classic",
    main: STANDARD_ORDER,
    sidebar: &[],
    show_relevance: false,
};

const MODERN: LayoutSpec = LayoutSpec {
    class: "modern",
    main: &[
        Section::Summary,
        Section::Experience,
        Section::Education,
        Section::Projects,
        Section::Activities,
        Section::AdditionalInfo,
    ],
    sidebar: &[
        Section::Skills,
        Section::Languages,
        Section::Certifications,
        Section::CustomFields,
    ],
    show_relevance: false,
};

const MINIMAL: LayoutSpec = LayoutSpec {
    class: "minimal",
    main: &[
        Section::Summary,
        Section::Experience,
        Section::Education,
        Section::Skills,
        Section::Projects,
    ],
    sidebar: &[],
    show_relevance: false,
};

const PROFESSIONAL: LayoutSpec = LayoutSpec {
    class: "professional",
    main: &[
        Section::Experience,
        Section::Summary,
        Section::Skills,
        Section::Education,
        Section::Projects,
        Section::Certifications,
        Section::Languages,
        Section::Activities,
        Section::AdditionalInfo,
        Section::CustomFields,
    ],
    sidebar: &[],
    show_relevance: true,
};

const CREATIVE: LayoutSpec = LayoutSpec {
    class: "creative",
    main: &[
        Section::Summary,
        Section::Projects,
        Section::Experience,
        Section::Education,
        Section::Activities,
        Section::AdditionalInfo,
    ],
    sidebar: &[Section::Skills, Section::Languages, Section::CustomFields],
    show_relevance: false,
};

const EXECUTIVE: LayoutSpec = LayoutSpec {
    class: "executive",
    main: &[
        Section::Summary,
        Section::Experience,
        Section::Certifications,
        Section::Education,
        Section::Skills,
        Section::Languages,
        Section::AdditionalInfo,
    ],
    sidebar: &[],
    show_relevance: true,
};

const COMPACT: LayoutSpec = LayoutSpec {
    class: "compact",
    main: &[
        Section::Experience,
        Section::Projects,
        Section::Education,
        Section::Activities,
    ],
    sidebar: &[
        Section::Summary,
        Section::Skills,
        Section::Certifications,
        Section::Languages,
        Section::AdditionalInfo,
        Section::CustomFields,
    ],
    show_relevance: false,
};

const ATS: LayoutSpec = LayoutSpec {
    class: "ats",
    main: STANDARD_ORDER,
    sidebar: &[],
    show_relevance: false,
};

pub fn classic(doc: &Document) -> PreviewNode {
    render_layout(doc, &CLASSIC)
}

pub fn modern(doc: &Document) -> PreviewNode {
    render_layout(doc, &MODERN)
}

pub fn minimal(doc: &Document) -> PreviewNode {
    render_layout(doc, &MINIMAL)
}

pub fn professional(doc: &Document) -> PreviewNode {
    render_layout(doc, &PROFESSIONAL)
}

pub fn creative(doc: &Document) -> PreviewNode {
    render_layout(doc, &CREATIVE)
}

pub fn executive(doc: &Document) -> PreviewNode {
    render_layout(doc, &EXECUTIVE)
}

pub fn compact(doc: &Document) -> PreviewNode {
    render_layout(doc, &COMPACT)
}

pub fn ats(doc: &Document) -> PreviewNode {
    render_layout(doc, &ATS)
}

pub fn render_layout(doc: &Document, spec: &LayoutSpec) -> PreviewNode {
    let main = sections(doc, spec.main, spec);
    let mut children = vec![header(doc)];

    if spec.sidebar.is_empty() {
        children.push(PreviewNode::el("main", "cv-main", main));
    } else {
        let sidebar = sections(doc, spec.sidebar, spec);
        children.push(PreviewNode::el(
            "div",
            "cv-columns",
            vec![
                PreviewNode::el("aside", "cv-sidebar", sidebar),
                PreviewNode::el("main", "cv-main", main),
            ],
        ));
    }

    PreviewNode::el("article", &format!("cv cv-{}", spec.class), children)
}

fn sections(doc: &Document, order: &[Section], spec: &LayoutSpec) -> Vec<PreviewNode> {
    order
        .iter()
        .filter_map(|s| {
            let body = section_body(doc, *s, spec);
            if body.is_empty() {
                return None;
            }
            let mut children = vec![PreviewNode::leaf("h2", "section-title", s.heading())];
            children.extend(body);
            Some(PreviewNode::el(
                "section",
                &format!("cv-section {}", s.class()),
                children,
            ))
        })
        .collect()
}

fn header(doc: &Document) -> PreviewNode {
    let info = &doc.personal_info;
    let name = info.full_name();
    let name = if name.is_empty() {
        "Your Name".to_string()
    } else {
        name
    };

    let mut children = vec![PreviewNode::leaf("h1", "name", name)];
    if !info.professional_headline.trim().is_empty() {
        children.push(PreviewNode::leaf(
            "p",
            "headline",
            info.professional_headline.trim(),
        ));
    }

    let contacts: Vec<PreviewNode> = [
        &info.email,
        &info.phone,
        &info.location,
        &info.website,
        &info.linkedin,
        &info.github,
    ]
    .into_iter()
    .map(|c| c.trim())
    .filter(|c| !c.is_empty())
    .map(|c| PreviewNode::leaf("li", "", c))
    .collect();
    if !contacts.is_empty() {
        children.push(PreviewNode::el("ul", "contact", contacts));
    }

    PreviewNode::el("header", "cv-header", children)
}

fn badge(relevance: u8) -> PreviewNode {
    PreviewNode::leaf("span", "relevance", format!("{relevance}% match"))
}

fn badges_enabled(doc: &Document, spec: &LayoutSpec) -> bool {
    spec.show_relevance && doc.kind == DocumentKind::Resume
}

fn item(title: String, subtitle: String, dates: String, extra: Vec<PreviewNode>) -> PreviewNode {
    let mut children = vec![PreviewNode::leaf("h3", "item-title", title)];
    if !subtitle.is_empty() {
        children.push(PreviewNode::leaf("p", "item-subtitle", subtitle));
    }
    if !dates.is_empty() {
        children.push(PreviewNode::leaf("p", "item-dates", dates));
    }
    children.extend(extra);
    PreviewNode::el("div", "item", children)
}

fn joined(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

fn paragraph(text: &str) -> Option<PreviewNode> {
    let text = text.trim();
    (!text.is_empty()).then(|| PreviewNode::leaf("p", "", text))
}

fn section_body(doc: &Document, section: Section, spec: &LayoutSpec) -> Vec<PreviewNode> {
    let badges = badges_enabled(doc, spec);
    match section {
        Section::Summary => paragraph(&doc.summary).into_iter().collect(),
        Section::Experience => doc
            .experience
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let mut extra: Vec<PreviewNode> = paragraph(&e.description).into_iter().collect();
                let achievements: Vec<_> = e
                    .achievements
                    .iter()
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| PreviewNode::leaf("li", "", a.trim()))
                    .collect();
                if !achievements.is_empty() {
                    extra.push(PreviewNode::el("ul", "achievements", achievements));
                }
                if badges {
                    if let Some(m) = doc.matched_experience.get(i) {
                        extra.push(badge(m.relevance));
                    }
                }
                item(
                    e.position.trim().to_string(),
                    joined(&[&e.company, &e.location]),
                    date_range(&e.start_date, &e.end_date, e.current),
                    extra,
                )
            })
            .collect(),
        Section::Education => doc
            .education
            .iter()
            .map(|e| {
                let degree = joined(&[&e.degree, &e.field_of_study]);
                let mut extra: Vec<PreviewNode> = Vec::new();
                if !e.gpa.trim().is_empty() {
                    extra.push(PreviewNode::leaf("p", "gpa", format!("GPA {}", e.gpa.trim())));
                }
                extra.extend(paragraph(&e.description));
                item(
                    e.institution.trim().to_string(),
                    joined(&[&degree, &e.location]),
                    date_range(&e.start_date, &e.end_date, e.current),
                    extra,
                )
            })
            .collect(),
        Section::Skills => {
            let skills: Vec<PreviewNode> = doc
                .skills
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.trim().is_empty())
                .map(|(i, s)| {
                    let mut children = vec![PreviewNode::text(s.trim())];
                    if badges {
                        if let Some(m) = doc.matched_skills.get(i) {
                            children.push(badge(m.relevance));
                        }
                    }
                    PreviewNode::el("li", "skill", children)
                })
                .collect();
            if skills.is_empty() {
                Vec::new()
            } else {
                vec![PreviewNode::el("ul", "skill-list", skills)]
            }
        }
        Section::Projects => doc
            .projects
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut extra: Vec<PreviewNode> = paragraph(&p.description).into_iter().collect();
                if !p.technologies.is_empty() {
                    extra.push(PreviewNode::leaf(
                        "p",
                        "technologies",
                        p.technologies.join(", "),
                    ));
                }
                if badges {
                    if let Some(m) = doc.matched_projects.get(i) {
                        extra.push(badge(m.relevance));
                    }
                }
                item(
                    p.name.trim().to_string(),
                    p.url.trim().to_string(),
                    date_range(&p.start_date, &p.end_date, false),
                    extra,
                )
            })
            .collect(),
        Section::Certifications => doc
            .certifications
            .iter()
            .map(|c| {
                let extra = if c.credential_id.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![PreviewNode::leaf(
                        "p",
                        "credential",
                        format!("Credential {}", c.credential_id.trim()),
                    )]
                };
                item(
                    c.name.trim().to_string(),
                    c.issuer.trim().to_string(),
                    date_range(&c.date, &c.expiry_date, false),
                    extra,
                )
            })
            .collect(),
        Section::Languages => {
            let languages: Vec<PreviewNode> = doc
                .languages
                .iter()
                .filter(|l| !l.language.trim().is_empty())
                .map(|l| {
                    let text = if l.proficiency.trim().is_empty() {
                        l.language.trim().to_string()
                    } else {
                        format!("{} ({})", l.language.trim(), l.proficiency.trim())
                    };
                    PreviewNode::leaf("li", "", text)
                })
                .collect();
            if languages.is_empty() {
                Vec::new()
            } else {
                vec![PreviewNode::el("ul", "language-list", languages)]
            }
        }
        Section::Activities => doc
            .activities
            .iter()
            .map(|a| {
                item(
                    a.title.trim().to_string(),
                    a.organization.trim().to_string(),
                    date_range(&a.start_date, &a.end_date, false),
                    paragraph(&a.description).into_iter().collect(),
                )
            })
            .collect(),
        Section::AdditionalInfo => {
            let info = &doc.additional_info;
            let mut out = Vec::new();
            for (label, value) in [
                ("Interests", &info.interests),
                ("Achievements", &info.achievements),
                ("Publications", &info.publications),
                ("References", &info.references),
            ] {
                if !value.trim().is_empty() {
                    out.push(PreviewNode::el(
                        "div",
                        "info-block",
                        vec![
                            PreviewNode::leaf("h3", "item-title", label),
                            PreviewNode::leaf("p", "", value.trim()),
                        ],
                    ));
                }
            }
            for custom in &info.custom_sections {
                if custom.title.trim().is_empty() && custom.content.trim().is_empty() {
                    continue;
                }
                out.push(PreviewNode::el(
                    "div",
                    "info-block",
                    vec![
                        PreviewNode::leaf("h3", "item-title", custom.title.trim()),
                        PreviewNode::leaf("p", "", custom.content.trim()),
                    ],
                ));
            }
            out
        }
        Section::CustomFields => {
            let rows: Vec<PreviewNode> = doc
                .custom_fields
                .iter()
                .filter(|f| !f.label.trim().is_empty() || !f.value.trim().is_empty())
                .map(|f| {
                    PreviewNode::el(
                        "li",
                        "",
                        vec![
                            PreviewNode::leaf("strong", "", format!("{}: ", f.label.trim())),
                            PreviewNode::text(f.value.trim()),
                        ],
                    )
                })
                .collect();
            if rows.is_empty() {
                Vec::new()
            } else {
                vec![PreviewNode::el("ul", "field-list", rows)]
            }
        }
    }
}
