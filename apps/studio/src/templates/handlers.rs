//! Axum route handlers for the template picker.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::templates::registry::{self, TemplateSummary, DEFAULT_TEMPLATE_ID};

#[derive(Debug, Deserialize)]
pub struct TemplateListQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateSummary>,
    pub total: usize,
    pub default_id: &'static str,
}

/// GET /api/v1/templates
///
/// Returns the collapsed picker (first N entries) unless `all=true`.
pub async fn handle_list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> Json<TemplateListResponse> {
    let entries = if query.all {
        registry::list_all()
    } else {
        registry::list_default_n(query.limit.unwrap_or(state.config.default_template_limit))
    };

    Json(TemplateListResponse {
        templates: entries.iter().map(|t| t.summary()).collect(),
        total: registry::list_all().len(),
        default_id: DEFAULT_TEMPLATE_ID,
    })
}
