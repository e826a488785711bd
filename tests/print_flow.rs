//! # Print Flow Tests
//!
//! End-to-end behavior of the binding and print pipeline through the public
//! API: resolve, edit, gate, generate, execute.
//!
//! ## Test Coverage
//!
//! - **Resolution**: derived defaults with no edits
//! - **Ledger**: an edit typed back to its original disappears
//! - **Gate**: clean selections print directly; edited ones need a
//!   justification of the configured length
//! - **Document**: one page per product, breaks between pages only
//! - **Assets**: a header that never loads yields the text banner

use std::sync::Arc;
use std::time::Duration;

use carteles::audit::{AuditGate, PrintDecision, RecordingReportSender};
use carteles::catalog::{InMemoryCatalog, Product};
use carteles::config::EngineConfig;
use carteles::document::{PAGE_BREAK, PrintConfiguration, StaticAssetProbe};
use carteles::fields::FieldId;
use carteles::ledger::ChangeLedger;
use carteles::print::{FakeSurface, ImageBehavior, PrintMode, SurfaceCall};
use carteles::session::PrintSession;
use carteles::template::InMemoryTemplateStore;
use carteles::value::FieldValue;
use carteles::{CartelError, ValueResolver};
use chrono::NaiveDate;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new([
        Product::new("P1", "Widget", 1000.0).sku("100200").brand("Acme"),
        Product::new("P2", "Gadget", 2500.0).sku("100300"),
        Product::new("P3", "Gizmo", 420.5).sku("100400"),
    ])
}

fn session_with(config: EngineConfig, probe: StaticAssetProbe, reporter: Arc<RecordingReportSender>) -> PrintSession {
    let resolver = ValueResolver::new(config.resolver.clone(), today());
    PrintSession::new(
        config,
        Arc::new(InMemoryTemplateStore::builtin()),
        Arc::new(catalog()),
        Arc::new(probe),
        reporter,
    )
    .unwrap()
    .with_resolver(resolver)
}

fn session() -> PrintSession {
    session_with(
        EngineConfig::default(),
        StaticAssetProbe::new(),
        Arc::new(RecordingReportSender::new()),
    )
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// RESOLUTION AND LEDGER
// ============================================================================

#[test]
fn test_tax_excluded_price_without_edits() {
    let resolver = ValueResolver::new(EngineConfig::default().resolver, today());
    let product = Product::new("P1", "Widget", 1000.0);
    let value = resolver
        .resolve_named(&product, "precioSinImpuestos", &ChangeLedger::new())
        .unwrap();
    assert_eq!(value, FieldValue::Currency(830.0));
}

#[test]
fn test_edit_reverted_leaves_no_entry() {
    let mut ledger = ChangeLedger::new();
    ledger.track_change(
        "P1",
        "Widget",
        FieldId::PrecioActual,
        FieldValue::Currency(1000.0),
        FieldValue::Currency(1200.0),
    );
    ledger.track_change(
        "P1",
        "Widget",
        FieldId::PrecioActual,
        FieldValue::Currency(1200.0),
        FieldValue::Currency(1000.0),
    );
    assert!(ledger.product("P1").is_none());
    assert!(!ledger.has_any_changes());
}

#[test]
fn test_formatting_differences_are_not_edits() {
    let mut session = session();
    session.edit_field("P1", "precioActual", "1000.00").unwrap();
    session.edit_field("P1", "sap", " 100200 ").unwrap();
    assert!(!session.ledger().has_any_changes());
}

// ============================================================================
// AUDIT GATE
// ============================================================================

#[test]
fn test_clean_selection_proceeds_direct() {
    let gate = AuditGate::new(10);
    let decision = gate.request_print(&ChangeLedger::new(), &ids(&["P1", "P2"]));
    assert!(matches!(decision, PrintDecision::ProceedDirect));
}

#[test]
fn test_edited_selection_needs_justification() {
    let mut ledger = ChangeLedger::new();
    ledger.track_change(
        "P1",
        "Widget",
        FieldId::PrecioActual,
        FieldValue::Currency(1000.0),
        FieldValue::Currency(1200.0),
    );
    let gate = AuditGate::new(10);
    let PrintDecision::RequireJustification(pending) =
        gate.request_print(&ledger, &ids(&["P1", "P2"]))
    else {
        panic!("edited selection must need a justification");
    };

    assert!(matches!(
        pending.approve("ab", "oferta", "porcentaje"),
        Err(CartelError::JustificationTooShort { min: 10, actual: 2 })
    ));
    let approval = pending
        .approve("Precio acordado con el proveedor", "oferta", "porcentaje")
        .unwrap();
    assert_eq!(approval.report.edited_products.len(), 1);
    assert_eq!(approval.report.edited_products[0].changes[0].new_value, "$1.200");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_audit_has_no_side_effects() {
    let reporter = Arc::new(RecordingReportSender::new());
    let mut session = session_with(EngineConfig::default(), StaticAssetProbe::new(), reporter.clone());
    session.edit_field("P1", "nombre", "Widget XL").unwrap();
    let before = session.ledger().clone();

    let decision = session.request_print(&ids(&["P1"]));
    assert!(decision.requires_justification());
    drop(decision);

    assert_eq!(session.ledger(), &before);
    assert!(reporter.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_report_service_aborts_print() {
    let mut config = EngineConfig::default();
    config.audit.report_timeout_ms = 2_000;
    let reporter = Arc::new(RecordingReportSender::stalling(Duration::from_secs(60)));
    let mut session = session_with(config, StaticAssetProbe::new(), reporter);
    session.edit_field("P1", "precioActual", "1200").unwrap();

    let mut surface = FakeSurface::new();
    let print = PrintConfiguration::new("oferta", "porcentaje", ["P1"]);
    let err = session
        .confirm_print(&print, "Precio acordado con el proveedor", &mut surface)
        .await
        .unwrap_err();

    assert!(matches!(err, CartelError::ReportSendFailed(_)));
    assert!(err.is_user_recoverable());
    assert!(surface.calls().is_empty());
}

// ============================================================================
// DOCUMENT AND PRINT
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_three_products_three_pages() {
    let session = session();
    let print = PrintConfiguration::new("oferta", "porcentaje", ["P1", "P2", "P3"]);
    let document = session.preview(&print).await.unwrap();

    assert_eq!(document.page_count(), 3);
    let html = document.to_html();
    assert_eq!(html.matches(PAGE_BREAK).count(), 2);
    let last_page = html.rfind("<section").unwrap();
    assert!(!html[last_page..].contains(PAGE_BREAK));
}

#[tokio::test(start_paused = true)]
async fn test_header_that_never_loads_falls_back_to_banner() {
    let mut config = EngineConfig::default();
    config.layout.header_asset = Some("https://cdn.example.com/header.png".into());
    config.layout.header_fallback_text = "SUPER OFERTAS".into();
    let session = session_with(
        config,
        StaticAssetProbe::never_resolving(),
        Arc::new(RecordingReportSender::new()),
    );

    let print = PrintConfiguration::new("superprecio", "clasico", ["P1", "P2", "P3"]);
    let document = session.preview(&print).await.unwrap();

    assert_eq!(document.page_count(), 3);
    assert!(document.header.is_fallback());
    assert_eq!(document.to_html().matches("SUPER OFERTAS").count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_justified_print_end_to_end() {
    let reporter = Arc::new(RecordingReportSender::new());
    let mut session = session_with(EngineConfig::default(), StaticAssetProbe::new(), reporter.clone());
    session.edit_field("P2", "precioActual", "1999,90").unwrap();

    let mut surface = FakeSurface::new().images(ImageBehavior::Never);
    let print = PrintConfiguration::new("liquidacion", "total", ["P1", "P2"]);
    let receipt = session
        .confirm_print(&print, "Liquidación por cierre de temporada", &mut surface)
        .await
        .unwrap();

    assert_eq!(receipt.outcome.mode, PrintMode::Document);
    assert_eq!(receipt.outcome.pages, 2);
    assert_eq!(reporter.sent().len(), 1);
    assert_eq!(reporter.sent()[0].family, "liquidacion");

    let calls = surface.calls();
    assert_eq!(calls.first(), Some(&SurfaceCall::Open));
    assert!(calls.contains(&SurfaceCall::Print));
    assert_eq!(calls.last(), Some(&SurfaceCall::Close));
    assert!(surface.html().unwrap().contains("$1.999,90"));
}

#[test]
fn test_out_of_range_layout_rejected_before_any_preview() {
    let mut config = EngineConfig::default();
    config.layout.min_scale = 2.0;
    config.layout.max_scale = 1.0;
    assert!(config.validate().is_err());

    let result = PrintSession::new(
        config,
        Arc::new(InMemoryTemplateStore::builtin()),
        Arc::new(catalog()),
        Arc::new(StaticAssetProbe::new()),
        Arc::new(RecordingReportSender::new()),
    );
    assert!(matches!(result, Err(CartelError::Config(_))));
}
