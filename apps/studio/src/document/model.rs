use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Relevance assigned to matched entries that have no score of their own.
pub const DEFAULT_RELEVANCE: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    Cv,
    Resume,
}

impl DocumentKind {
    /// Collection name used by the persistence backend.
    pub fn resource(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cvs",
            DocumentKind::Resume => "resumes",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entity records
//
// Backend records are loosely typed. Every scalar field goes through a lenient
// deserializer so a number, bool or null degrades to a string or default
// instead of failing the whole record. Legacy field names are folded in by
// `document::hydrate` before these types see the data.
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub website: String,
    #[serde(deserialize_with = "lenient_string")]
    pub linkedin: String,
    #[serde(deserialize_with = "lenient_string")]
    pub github: String,
    #[serde(deserialize_with = "lenient_string")]
    pub professional_headline: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub current: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient_string")]
    pub field_of_study: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub current: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub gpa: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issuer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub expiry_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub credential_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub language: String,
    #[serde(deserialize_with = "lenient_string")]
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub organization: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomSection {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub interests: String,
    #[serde(deserialize_with = "lenient_string")]
    pub achievements: String,
    #[serde(deserialize_with = "lenient_string")]
    pub publications: String,
    #[serde(deserialize_with = "lenient_string")]
    pub references: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub custom_sections: Vec<CustomSection>,
}

impl AdditionalInfo {
    pub fn is_empty(&self) -> bool {
        [
            &self.interests,
            &self.achievements,
            &self.publications,
            &self.references,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
            && self.custom_sections.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomField {
    #[serde(deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateRef {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field deserializers
// ────────────────────────────────────────────────────────────────────────────

/// Renders a scalar as text. Objects and arrays have no text form.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strings pass through; numbers and bools are rendered; anything else is empty.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text).unwrap_or_default())
}

/// Like `lenient_string`, but blank becomes `None`.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}

/// Accepts bools, `"true"`/`"yes"`/`"1"` strings and non-zero numbers.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

/// An array of scalars, or a single comma-separated string.
pub(crate) fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(string_list(value.as_ref()))
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// An array of records; elements that are not records are dropped.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Matched (relevance-scored) views
// ────────────────────────────────────────────────────────────────────────────

/// Identity used to carry relevance scores across canonical edits.
pub trait MatchKey {
    fn match_key(&self) -> String;
}

impl MatchKey for String {
    fn match_key(&self) -> String {
        self.clone()
    }
}

impl MatchKey for ExperienceEntry {
    fn match_key(&self) -> String {
        format!("{}\u{1f}{}", self.position, self.company)
    }
}

impl MatchKey for ProjectEntry {
    fn match_key(&self) -> String {
        self.name.clone()
    }
}

impl MatchKey for CertificationEntry {
    fn match_key(&self) -> String {
        format!("{}\u{1f}{}", self.name, self.issuer)
    }
}

impl MatchKey for LanguageEntry {
    fn match_key(&self) -> String {
        self.language.clone()
    }
}

/// A matched entry wrapping one canonical element with its relevance score.
pub trait Paired: Sized {
    type Item: Clone + MatchKey;

    fn wrap(item: Self::Item, relevance: u8, comment: Option<String>) -> Self;
    fn item(&self) -> &Self::Item;
    fn relevance(&self) -> u8;
    fn comment(&self) -> Option<&str>;

    fn wrap_default(item: Self::Item) -> Self {
        Self::wrap(item, DEFAULT_RELEVANCE, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSkill {
    #[serde(default, deserialize_with = "lenient_string")]
    pub skill: String,
    #[serde(
        default = "default_relevance",
        deserialize_with = "lenient_relevance"
    )]
    pub relevance: u8,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,
}

impl Paired for MatchedSkill {
    type Item = String;

    fn wrap(skill: String, relevance: u8, comment: Option<String>) -> Self {
        Self {
            skill,
            relevance,
            comment,
        }
    }

    fn item(&self) -> &String {
        &self.skill
    }

    fn relevance(&self) -> u8 {
        self.relevance
    }

    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Generic matched wrapper: the canonical record's fields plus `relevance`/`comment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scored<T> {
    #[serde(flatten)]
    pub entry: T,
    #[serde(
        default = "default_relevance",
        deserialize_with = "lenient_relevance"
    )]
    pub relevance: u8,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,
}

impl<T: Clone + MatchKey> Paired for Scored<T> {
    type Item = T;

    fn wrap(entry: T, relevance: u8, comment: Option<String>) -> Self {
        Self {
            entry,
            relevance,
            comment,
        }
    }

    fn item(&self) -> &T {
        &self.entry
    }

    fn relevance(&self) -> u8 {
        self.relevance
    }

    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

fn default_relevance() -> u8 {
    DEFAULT_RELEVANCE
}

/// Accepts integers, floats, numeric strings or null; clamps into 0–100.
fn lenient_relevance<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(DEFAULT_RELEVANCE))
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// The in-progress CV or resume owned by one editing session.
///
/// Paired fields (`skills`/`matchedSkills` and friends) are kept element-consistent
/// by `document::sync`; nothing else should write them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub kind: DocumentKind,
    pub id: Option<String>,
    pub title: Option<String>,
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub languages: Vec<LanguageEntry>,
    pub activities: Vec<ActivityEntry>,
    pub skills: Vec<String>,
    pub matched_skills: Vec<MatchedSkill>,
    pub matched_experience: Vec<Scored<ExperienceEntry>>,
    pub matched_projects: Vec<Scored<ProjectEntry>>,
    pub matched_certifications: Vec<Scored<CertificationEntry>>,
    pub matched_languages: Vec<Scored<LanguageEntry>>,
    pub additional_info: AdditionalInfo,
    pub custom_fields: Vec<CustomField>,
    pub template: TemplateRef,
    pub role_apply: Option<String>,
    /// Snapshot of `personal_info` taken at hydration; never edited afterwards.
    pub original_personal_info: PersonalInfo,
    /// Headline the user had written when a `roleApply` override replaced it.
    #[serde(skip)]
    pub headline_before_override: Option<String>,
}

impl Document {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// The `roleApply` override, if this is a resume with a non-blank target role.
    pub fn headline_override(&self) -> Option<&str> {
        if self.kind != DocumentKind::Resume {
            return None;
        }
        self.role_apply
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// The headline the user wrote, ignoring any `roleApply` override.
    pub fn user_headline(&self) -> &str {
        self.headline_before_override
            .as_deref()
            .unwrap_or(&self.original_personal_info.professional_headline)
    }

    /// Wire payload for the persistence backend.
    ///
    /// The snapshot is never sent, and a headline still showing the `roleApply`
    /// override is replaced by the user's own headline.
    pub fn to_wire(&self) -> Value {
        let mut outgoing = self.clone();
        if let Some(role) = self.headline_override() {
            if outgoing.personal_info.professional_headline.trim() == role {
                outgoing.personal_info.professional_headline = self.user_headline().to_string();
            }
        }
        if outgoing.kind != DocumentKind::Resume {
            outgoing.role_apply = None;
        }

        let mut value = serde_json::to_value(&outgoing).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.remove("originalPersonalInfo");
            map.remove("kind");
            if map.get("roleApply").is_some_and(Value::is_null) {
                map.remove("roleApply");
            }
        }
        value
    }
}
