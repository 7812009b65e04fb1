//! Template resolver: a static registry of preview templates.
//!
//! Lookups never fail: a missing or unknown id resolves to the default entry.

use serde::Serialize;

use crate::document::model::{Document, TemplateRef};
use crate::templates::layouts;
use crate::templates::render::PreviewNode;

pub type RenderFn = fn(&Document) -> PreviewNode;

pub const DEFAULT_TEMPLATE_ID: &str = "classic";

#[derive(Debug, Clone, Copy)]
pub struct TemplateEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub render: RenderFn,
}

/// Serializable view of an entry, without the render function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_default: bool,
}

impl TemplateEntry {
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id,
            name: self.name,
            description: self.description,
            is_default: self.id == DEFAULT_TEMPLATE_ID,
        }
    }

    pub fn to_template_ref(&self) -> TemplateRef {
        TemplateRef {
            id: self.id.to_string(),
            name: self.name.to_string(),
        }
    }
}

// Picker order; the first five are shown before "show more".
static REGISTRY: [TemplateEntry; 8] = [
    TemplateEntry {
        id: "classic",
        name: "Classic",
        description: "Single column, serif headings, timeless layout",
        render: layouts::classic,
    },
    TemplateEntry {
        id: "modern",
        name: "Modern",
        description: "Two columns with a skills sidebar",
        render: layouts::modern,
    },
    TemplateEntry {
        id: "minimal",
        name: "Minimal",
        description: "Generous whitespace, no decoration",
        render: layouts::minimal,
    },
    TemplateEntry {
        id: "professional",
        name: "Professional",
        description: "Experience first, relevance badges for tailored resumes",
        render: layouts::professional,
    },
    TemplateEntry {
        id: "creative",
        name: "Creative",
        description: "Accent header with projects up front",
        render: layouts::creative,
    },
    TemplateEntry {
        id: "executive",
        name: "Executive",
        description: "Summary-led layout for senior roles",
        render: layouts::executive,
    },
    TemplateEntry {
        id: "compact",
        name: "Compact",
        description: "Dense two-column layout that fits one page",
        render: layouts::compact,
    },
    TemplateEntry {
        id: "ats",
        name: "ATS Friendly",
        description: "Plain single column tuned for applicant tracking systems",
        render: layouts::ats,
    },
];

pub fn resolve(id: Option<&str>) -> &'static TemplateEntry {
    id.and_then(find).unwrap_or_else(default_entry)
}

pub fn default_entry() -> &'static TemplateEntry {
    find(DEFAULT_TEMPLATE_ID).unwrap_or(&REGISTRY[0])
}

pub fn list_all() -> &'static [TemplateEntry] {
    &REGISTRY
}

pub fn list_default_n(n: usize) -> &'static [TemplateEntry] {
    &REGISTRY[..n.min(REGISTRY.len())]
}

/// Rewrites a template reference so it always points at a registered entry.
pub fn normalize(template: &TemplateRef) -> TemplateRef {
    let id = Some(template.id.trim()).filter(|id| !id.is_empty());
    resolve(id).to_template_ref()
}

pub fn find(id: &str) -> Option<&'static TemplateEntry> {
    REGISTRY.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_and_missing_resolve_to_default() {
        let default = resolve(Some(DEFAULT_TEMPLATE_ID));
        assert!(std::ptr::eq(resolve(None), default));
        assert!(std::ptr::eq(resolve(Some("does-not-exist")), default));
        assert!(std::ptr::eq(resolve(Some("")), default));
    }

    #[test]
    fn test_exact_lookup() {
        assert_eq!(resolve(Some("modern")).name, "Modern");
        assert_eq!(resolve(Some("ats")).id, "ats");
    }

    #[test]
    fn test_default_is_registered() {
        assert_eq!(default_entry().id, DEFAULT_TEMPLATE_ID);
        assert!(list_all().iter().any(|t| t.id == DEFAULT_TEMPLATE_ID));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = list_all().iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), list_all().len());
    }

    #[test]
    fn test_list_default_n_slices_in_order() {
        let first: Vec<_> = list_default_n(5).iter().map(|t| t.id).collect();
        assert_eq!(
            first,
            vec!["classic", "modern", "minimal", "professional", "creative"]
        );
        assert_eq!(list_default_n(0).len(), 0);
        assert_eq!(list_default_n(100).len(), list_all().len());
    }

    #[test]
    fn test_normalize_fills_name() {
        let normalized = normalize(&TemplateRef {
            id: " compact ".into(),
            name: String::new(),
        });
        assert_eq!(normalized.id, "compact");
        assert_eq!(normalized.name, "Compact");
    }
}
