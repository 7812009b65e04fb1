use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::model::Document;

/// Field keys reported by the validator. Serialised as the document's camelCase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    FirstName,
    LastName,
    Email,
    Phone,
    ProfessionalHeadline,
}

/// Result of a validation pass.
///
/// `errors` block saving. `warnings` are recommendations the user may
/// override with "save anyway".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: BTreeMap<FieldKey, String>,
    pub warnings: BTreeMap<FieldKey, String>,
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

fn email_re() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn phone_re() -> &'static Regex {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    PHONE_RE.get_or_init(|| Regex::new(r"^[0-9+\-() ]{6,20}$").expect("valid phone pattern"))
}

/// Checks required personal fields. Pure: it reports and never blocks.
///
/// Required: first name, last name, email (present and well-formed).
/// Optional but checked: phone format when present.
/// Recommended: professional headline (warning only).
pub fn validate_required(document: &Document) -> ValidationReport {
    let info = &document.personal_info;
    let mut errors = BTreeMap::new();
    let mut warnings = BTreeMap::new();

    if info.first_name.trim().is_empty() {
        errors.insert(FieldKey::FirstName, "First name is required".to_string());
    }
    if info.last_name.trim().is_empty() {
        errors.insert(FieldKey::LastName, "Last name is required".to_string());
    }

    let email = info.email.trim();
    if email.is_empty() {
        errors.insert(FieldKey::Email, "Email is required".to_string());
    } else if !email_re().is_match(email) {
        errors.insert(
            FieldKey::Email,
            "Please enter a valid email address".to_string(),
        );
    }

    let phone = info.phone.trim();
    if !phone.is_empty() && !phone_re().is_match(phone) {
        errors.insert(
            FieldKey::Phone,
            "Please enter a valid phone number".to_string(),
        );
    }

    if info.professional_headline.trim().is_empty() {
        warnings.insert(
            FieldKey::ProfessionalHeadline,
            "A professional headline is recommended".to_string(),
        );
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
