//! Template listing and field set handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::ApiResult;
use crate::fields::FieldSet;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub family: String,
    pub variant: String,
    /// Display name of the family, when registered.
    pub label: Option<String>,
}

/// Handle GET /api/templates - list every stored family/variant.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<TemplateInfo>> {
    let session = state.session.read().await;
    let templates = session
        .store()
        .variants()
        .into_iter()
        .map(|(family, variant)| TemplateInfo {
            label: session.registry().family(&family).map(|f| f.label.clone()),
            family,
            variant,
        })
        .collect();
    Json(templates)
}

/// Handle GET /api/templates/:family/:variant/fields - the variant's field set.
pub async fn fields(
    State(state): State<Arc<AppState>>,
    Path((family, variant)): Path<(String, String)>,
) -> ApiResult<Json<FieldSet>> {
    let session = state.session.read().await;
    Ok(Json(session.field_set(&family, &variant)?))
}
