//! # HTTP Server for Cartel Editing and Printing
//!
//! A JSON API over one shared [`PrintSession`].
//!
//! ## Usage
//!
//! ```bash
//! carteles serve --listen 0.0.0.0:8080 --catalog productos.json
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/api/templates` | Stored families and variants |
//! | GET | `/api/templates/:family/:variant/fields` | Field set of a variant |
//! | GET | `/api/products/:id/values?family&variant` | Effective values |
//! | GET | `/api/ledger` | Pending edits |
//! | POST | `/api/ledger/changes` | Apply a typed edit |
//! | DELETE | `/api/ledger` | Forget every edit |
//! | DELETE | `/api/ledger/:product_id` | Forget one product's edits |
//! | POST | `/api/print/request` | Does the selection need a justification? |
//! | POST | `/api/print/confirm` | Report (if needed) and print |
//! | POST | `/api/document/preview` | Assembled HTML |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::CartelError;
use crate::session::PrintSession;

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Templates
        .route("/api/templates", get(handlers::templates::list))
        .route(
            "/api/templates/:family/:variant/fields",
            get(handlers::templates::fields),
        )
        // Values and edits
        .route("/api/products/:id/values", get(handlers::ledger::values))
        .route(
            "/api/ledger",
            get(handlers::ledger::list).delete(handlers::ledger::clear),
        )
        .route("/api/ledger/changes", post(handlers::ledger::change))
        .route("/api/ledger/:product_id", delete(handlers::ledger::remove))
        // Printing
        .route("/api/print/request", post(handlers::print::request))
        .route("/api/print/confirm", post(handlers::print::confirm))
        .route("/api/document/preview", post(handlers::document::preview))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use carteles::catalog::InMemoryCatalog;
/// use carteles::config::EngineConfig;
/// use carteles::server::{serve, ServerConfig};
/// use carteles::session::PrintSession;
/// use carteles::template::InMemoryTemplateStore;
///
/// # async fn example() -> Result<(), carteles::CartelError> {
/// let session = PrintSession::from_config(
///     EngineConfig::default(),
///     Arc::new(InMemoryTemplateStore::builtin()),
///     Arc::new(InMemoryCatalog::default()),
/// )?;
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
///
/// serve(config, session).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, session: PrintSession) -> Result<(), CartelError> {
    let app = router(Arc::new(AppState::new(session)));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| CartelError::Config(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;

    info!(listen = %config.listen_addr, "carteles HTTP server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingReportSender;
    use crate::catalog::{InMemoryCatalog, Product};
    use crate::config::EngineConfig;
    use crate::document::StaticAssetProbe;
    use crate::template::InMemoryTemplateStore;
    use serde_json::{Value, json};

    async fn spawn(output_dir: &std::path::Path) -> String {
        spawn_with(output_dir, RecordingReportSender::new()).await
    }

    async fn spawn_with(output_dir: &std::path::Path, reporter: RecordingReportSender) -> String {
        let mut config = EngineConfig::default();
        config.print.output_dir = output_dir.to_path_buf();
        config.print.teardown_grace_ms = 0;
        let session = PrintSession::new(
            config,
            Arc::new(InMemoryTemplateStore::builtin()),
            Arc::new(InMemoryCatalog::new([
                Product::new("P1", "Widget", 1000.0).sku("100"),
                Product::new("P2", "Gadget", 2500.0).sku("200"),
            ])),
            Arc::new(StaticAssetProbe::new()),
            Arc::new(reporter),
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(AppState::new(session)));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_edit_then_justified_print() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path()).await;
        let client = reqwest::Client::new();

        let fields: Value = client
            .get(format!("{}/api/templates/oferta/porcentaje/fields", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(fields.as_array().unwrap().iter().any(|f| f["fieldId"] == "precioActual"));

        let change: Value = client
            .post(format!("{}/api/ledger/changes", base))
            .json(&json!({"productId": "P1", "field": "precioActual", "value": "1200"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(change["outcome"], "recorded");
        assert_eq!(change["hasAnyChanges"], true);

        let decision: Value = client
            .post(format!("{}/api/print/request", base))
            .json(&json!({"selectedProducts": ["P1", "P2"]}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(decision["decision"], "require_justification");
        assert_eq!(decision["minJustificationChars"], 10);

        let short = client
            .post(format!("{}/api/print/confirm", base))
            .json(&json!({
                "selectedProducts": ["P1", "P2"],
                "templateFamily": "oferta",
                "templateVariant": "porcentaje",
                "justification": "ab"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(short.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

        let printed: Value = client
            .post(format!("{}/api/print/confirm", base))
            .json(&json!({
                "selectedProducts": ["P1", "P2"],
                "templateFamily": "oferta",
                "templateVariant": "porcentaje",
                "justification": "Precio acordado con el proveedor"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(printed["success"], true);
        assert_eq!(printed["outcome"]["pages"], 2);
        let job = printed["job"].as_str().unwrap();
        assert!(std::fs::read_to_string(job).unwrap().contains("$1.200"));
    }

    #[tokio::test]
    async fn test_unknown_family_and_ledger_reset() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path()).await;
        let client = reqwest::Client::new();

        let missing = client
            .get(format!("{}/api/templates/navidad/arbol/fields", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        client
            .post(format!("{}/api/ledger/changes", base))
            .json(&json!({"productId": "P2", "field": "nombre", "value": "Gadget XL"}))
            .send()
            .await
            .unwrap();
        let cleared: Value = client
            .delete(format!("{}/api/ledger/P2", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(cleared["hasAnyChanges"], false);

        let preview = client
            .post(format!("{}/api/document/preview", base))
            .json(&json!({
                "selectedProducts": ["P2"],
                "templateFamily": "superprecio",
                "templateVariant": "clasico"
            }))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(preview.starts_with("<!DOCTYPE html>"));
        assert!(preview.contains("Gadget"));
    }

    #[tokio::test]
    async fn test_edits_not_blocked_by_running_print() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = RecordingReportSender::stalling(std::time::Duration::from_millis(1500));
        let base = spawn_with(dir.path(), reporter).await;
        let client = reqwest::Client::new();

        client
            .post(format!("{}/api/ledger/changes", base))
            .json(&json!({"productId": "P1", "field": "precioActual", "value": "1200"}))
            .send()
            .await
            .unwrap();

        let confirm = tokio::spawn({
            let client = client.clone();
            let base = base.clone();
            async move {
                client
                    .post(format!("{}/api/print/confirm", base))
                    .json(&json!({
                        "selectedProducts": ["P1"],
                        "templateFamily": "oferta",
                        "templateVariant": "porcentaje",
                        "justification": "Precio acordado con el proveedor"
                    }))
                    .send()
                    .await
                    .unwrap()
                    .status()
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let edit = tokio::time::timeout(
            std::time::Duration::from_millis(800),
            client
                .post(format!("{}/api/ledger/changes", base))
                .json(&json!({"productId": "P2", "field": "nombre", "value": "Gadget XL"}))
                .send(),
        )
        .await
        .expect("edit must not wait for the running print")
        .unwrap();
        assert!(edit.status().is_success());
        assert!(!confirm.is_finished());

        assert_eq!(confirm.await.unwrap(), reqwest::StatusCode::OK);
    }
}
