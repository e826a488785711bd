//! Field value and edit handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiResult;
use crate::ledger::{ChangeOutcome, EditedProduct};
use crate::resolve::ResolvedField;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    pub family: String,
    pub variant: String,
}

/// Handle GET /api/products/:id/values?family=..&variant=..
pub async fn values(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Query(query): Query<VariantQuery>,
) -> ApiResult<Json<Vec<ResolvedField>>> {
    let session = state.session.read().await;
    Ok(Json(session.values(&product_id, &query.family, &query.variant)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub product_id: String,
    /// Any recognized field identifier.
    pub field: String,
    /// The value as typed.
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub has_any_changes: bool,
    pub edit_count: usize,
    pub edited_products: Vec<EditedProduct>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResponse {
    pub outcome: ChangeOutcome,
    #[serde(flatten)]
    pub ledger: LedgerSummary,
}

fn summary(ledger: &crate::ledger::ChangeLedger) -> LedgerSummary {
    LedgerSummary {
        has_any_changes: ledger.has_any_changes(),
        edit_count: ledger.edit_count(),
        edited_products: ledger.edited_products().cloned().collect(),
    }
}

/// Handle GET /api/ledger - every pending edit.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<LedgerSummary> {
    let session = state.session.read().await;
    Json(summary(session.ledger()))
}

/// Handle POST /api/ledger/changes - apply one typed edit.
pub async fn change(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangeRequest>,
) -> ApiResult<Json<ChangeResponse>> {
    let mut session = state.session.write().await;
    let outcome = session.edit_field(&req.product_id, &req.field, &req.value)?;
    Ok(Json(ChangeResponse {
        outcome,
        ledger: summary(session.ledger()),
    }))
}

/// Handle DELETE /api/ledger - forget every edit.
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<LedgerSummary> {
    let mut session = state.session.write().await;
    session.clear_all();
    Json(summary(session.ledger()))
}

/// Handle DELETE /api/ledger/:product_id - forget one product's edits.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Json<LedgerSummary> {
    let mut session = state.session.write().await;
    session.remove_product(&product_id);
    Json(summary(session.ledger()))
}
