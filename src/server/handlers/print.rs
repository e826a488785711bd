//! Print request and confirmation handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiResult;
use crate::audit::PrintDecision;
use crate::document::PrintConfiguration;
use crate::ledger::EditedProduct;
use crate::print::HtmlFileSurface;
use crate::server::state::AppState;
use crate::session::PrintReceipt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub selected_products: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DecisionResponse {
    ProceedDirect,
    #[serde(rename_all = "camelCase")]
    RequireJustification {
        min_justification_chars: usize,
        edited_products: Vec<EditedProduct>,
    },
}

/// Handle POST /api/print/request - does this selection need a justification?
pub async fn request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PrintRequest>,
) -> Json<DecisionResponse> {
    let session = state.session.read().await;
    let response = match session.request_print(&req.selected_products) {
        PrintDecision::ProceedDirect => DecisionResponse::ProceedDirect,
        PrintDecision::RequireJustification(pending) => DecisionResponse::RequireJustification {
            min_justification_chars: pending.min_justification_chars(),
            edited_products: pending.edited_products().to_vec(),
        },
    };
    Json(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[serde(flatten)]
    pub config: PrintConfiguration,
    #[serde(default)]
    pub justification: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: PrintReceipt,
    /// Written job file.
    pub job: Option<String>,
}

/// Handle POST /api/print/confirm - justify (if needed), report, and print.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmRequest>,
) -> ApiResult<Json<ConfirmResponse>> {
    let mut surface = HtmlFileSurface::from_config(&state.print);
    // Snapshot: the lock is released before the report and print run.
    let session = state.session.read().await.clone();
    let receipt = session
        .confirm_print(&req.config, &req.justification, &mut surface)
        .await?;
    Ok(Json(ConfirmResponse {
        success: true,
        receipt,
        job: surface.job_path().map(|p| p.display().to_string()),
    }))
}
