use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::wizard::session::SubmitError;
use crate::wizard::sequencer::WizardError;
use crate::wizard::validation::ValidationReport;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A failed `validate_required`; the report is returned as `details`.
    #[error("Validation failed: {message}")]
    Invalid {
        message: String,
        report: ValidationReport,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backend error: {0}")]
    BadGateway(String),
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::StepOutOfRange(_) => AppError::Validation(err.to_string()),
            WizardError::NotAtSectionPicker(_) | WizardError::SectionNotSelected(_) => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound { .. } => AppError::NotFound(err.to_string()),
            GatewayError::MissingToken => AppError::Unauthorized(err.to_string()),
            GatewayError::MissingDocumentId => AppError::UnprocessableEntity(err.to_string()),
            GatewayError::InvalidBaseUrl(_)
            | GatewayError::Rejected(_)
            | GatewayError::Status { .. }
            | GatewayError::Http(_)
            | GatewayError::Decode(_) => AppError::BadGateway(err.to_string()),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(report) | SubmitError::NeedsOverride(report) => {
                AppError::Invalid {
                    message: if report.valid {
                        "recommended fields are empty; resubmit with saveAnyway to continue"
                            .to_string()
                    } else {
                        "required fields are missing or invalid".to_string()
                    },
                    report,
                }
            }
            SubmitError::MissingTitle => AppError::Validation(err.to_string()),
            SubmitError::NotAtReview
            | SubmitError::InFlight
            | SubmitError::UnexpectedStage { .. } => AppError::Conflict(err.to_string()),
            SubmitError::Gateway(inner) => inner.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Invalid { message, report } => {
                details = serde_json::to_value(&report).ok();
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg,
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::BadGateway(msg) => {
                tracing::error!("Backend error: {msg}");
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg)
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::validation::FieldKey;

    #[test]
    fn test_gateway_errors_map_to_status() {
        let cases = [
            (
                AppError::from(GatewayError::NotFound {
                    kind: "cvs",
                    id: "1".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (AppError::from(GatewayError::MissingToken), StatusCode::UNAUTHORIZED),
            (
                AppError::from(GatewayError::MissingDocumentId),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(GatewayError::Rejected("no".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_override_vs_invalid_message() {
        let mut report = ValidationReport::default();
        report.valid = true;
        report
            .warnings
            .insert(FieldKey::ProfessionalHeadline, "x".into());
        match AppError::from(SubmitError::NeedsOverride(report)) {
            AppError::Invalid { message, .. } => assert!(message.contains("saveAnyway")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_submit_flow_errors_are_conflicts() {
        let resp = AppError::from(SubmitError::NotAtReview).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = AppError::from(WizardError::StepOutOfRange(9)).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
