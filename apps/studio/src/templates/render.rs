//! Preview renderer: a pure projection of a document through a template into a
//! small visual tree, serialised to HTML for the browser preview pane.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::document::model::Document;
use crate::templates::registry::TemplateEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreviewNode {
    Element {
        tag: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        class: Option<String>,
        children: Vec<PreviewNode>,
    },
    Text {
        text: String,
    },
}

impl PreviewNode {
    pub fn el(tag: &'static str, class: &str, children: Vec<PreviewNode>) -> Self {
        PreviewNode::Element {
            tag,
            class: Some(class.to_string()).filter(|c| !c.is_empty()),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        PreviewNode::Text { text: text.into() }
    }

    /// Shorthand for an element holding a single text child.
    pub fn leaf(tag: &'static str, class: &str, text: impl Into<String>) -> Self {
        Self::el(tag, class, vec![Self::text(text)])
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            PreviewNode::Text { text } => out.push_str(&escape_html(text)),
            PreviewNode::Element {
                tag,
                class,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                if let Some(class) = class {
                    out.push_str(" class=\"");
                    out.push_str(&escape_html(class));
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Concatenated text of the subtree.
    #[cfg(test)]
    pub fn text_content(&self) -> String {
        match self {
            PreviewNode::Text { text } => text.clone(),
            PreviewNode::Element { children, .. } => {
                children.iter().map(PreviewNode::text_content).collect()
            }
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Formats a stored date for display as "Jan 2020".
///
/// Returns "Present" for ongoing entries and an empty string for blank input.
/// Anything that does not parse is returned unchanged.
pub fn format_date(date: &str, is_present: bool) -> String {
    if is_present {
        return "Present".to_string();
    }
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match parse_date(trimmed) {
        Some(parsed) => parsed.format("%b %Y").to_string(),
        None => date.to_string(),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // Month precision: pin to the first of the month.
    let candidates = [
        (format!("{s}-01"), "%Y-%m-%d"),
        (format!("{s}/01"), "%Y/%m/%d"),
        (format!("01/{s}"), "%d/%m/%Y"),
    ];
    candidates
        .iter()
        .find_map(|(candidate, fmt)| NaiveDate::parse_from_str(candidate, fmt).ok())
}

/// Joins a start and end date as "Jan 2020 - Present". Empty when both are blank.
pub fn date_range(start: &str, end: &str, current: bool) -> String {
    let start = format_date(start, false);
    let end = format_date(end, current);
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start,
        (true, false) => end,
        (false, false) => format!("{start} - {end}"),
    }
}

pub fn render_preview(document: &Document, template: &TemplateEntry) -> PreviewNode {
    (template.render)(document)
}

/// Remembers the last rendered preview for a document revision and template.
#[derive(Debug, Default)]
pub struct PreviewCache {
    key: Option<(u64, &'static str)>,
    html: Option<Arc<str>>,
    renders: u64,
}

impl PreviewCache {
    pub fn get_or_render(
        &mut self,
        revision: u64,
        document: &Document,
        template: &'static TemplateEntry,
    ) -> Arc<str> {
        let key = (revision, template.id);
        if self.key == Some(key) {
            if let Some(html) = &self.html {
                return Arc::clone(html);
            }
        }
        let html: Arc<str> = render_preview(document, template).to_html().into();
        self.key = Some(key);
        self.html = Some(Arc::clone(&html));
        self.renders += 1;
        debug!(
            "rendered {} preview for revision {} ({} renders so far)",
            template.id, revision, self.renders
        );
        html
    }

    /// Number of actual renders performed (cache misses).
    #[cfg(test)]
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::DocumentKind;
    use crate::templates::registry;

    #[test]
    fn test_format_date_present_and_blank() {
        assert_eq!(format_date("2020-01-01", true), "Present");
        assert_eq!(format_date("", false), "");
        assert_eq!(format_date("   ", false), "");
    }

    #[test]
    fn test_format_date_common_shapes() {
        assert_eq!(format_date("2021-03-15", false), "Mar 2021");
        assert_eq!(format_date("2021-03", false), "Mar 2021");
        assert_eq!(format_date("2021/11", false), "Nov 2021");
        assert_eq!(format_date("07/2019", false), "Jul 2019");
        assert_eq!(format_date("2022-06-01T00:00:00Z", false), "Jun 2022");
    }

    #[test]
    fn test_format_date_unparsable_returned_raw() {
        assert_eq!(format_date("Summer 2019", false), "Summer 2019");
        assert_eq!(format_date("2020", false), "2020");
    }

    #[test]
    fn test_date_range() {
        assert_eq!(date_range("2020-01", "", true), "Jan 2020 - Present");
        assert_eq!(date_range("2020-01", "2021-02", false), "Jan 2020 - Feb 2021");
        assert_eq!(date_range("", "", false), "");
        assert_eq!(date_range("2020-01", "", false), "Jan 2020");
    }

    #[test]
    fn test_html_is_escaped() {
        let node = PreviewNode::el(
            "p",
            "x\"y",
            vec![PreviewNode::text("<script>alert('hi') & bye</script>")],
        );
        assert_eq!(
            node.to_html(),
            "<p class=\"x&quot;y\">&lt;script&gt;alert(&#39;hi&#39;) &amp; bye&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_cache_hits_on_same_revision_and_template() {
        let doc = Document::new(DocumentKind::Cv);
        let classic = registry::resolve(Some("classic"));
        let modern = registry::resolve(Some("modern"));
        let mut cache = PreviewCache::default();

        let a = cache.get_or_render(1, &doc, classic);
        let b = cache.get_or_render(1, &doc, classic);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.renders(), 1);

        cache.get_or_render(2, &doc, classic);
        cache.get_or_render(2, &doc, modern);
        assert_eq!(cache.renders(), 3);
    }
}
