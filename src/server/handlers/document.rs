//! Document preview handler.

use axum::{
    Json,
    extract::State,
    response::{Html, IntoResponse},
};
use std::sync::Arc;

use super::ApiResult;
use crate::document::PrintConfiguration;
use crate::server::state::AppState;

/// Handle POST /api/document/preview - the assembled HTML, not printed.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(config): Json<PrintConfiguration>,
) -> ApiResult<impl IntoResponse> {
    let session = state.session.read().await.clone();
    let document = session.preview(&config).await?;
    Ok(Html(document.to_html()))
}
