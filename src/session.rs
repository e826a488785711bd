//! # Print Session
//!
//! The single owner of the [`ChangeLedger`]. Every edit and every print goes
//! through a named operation here, so the ledger invariants hold no matter
//! which front end (CLI, HTTP) drives the session.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use carteles::catalog::{InMemoryCatalog, Product};
//! use carteles::config::EngineConfig;
//! use carteles::document::PrintConfiguration;
//! use carteles::print::HtmlFileSurface;
//! use carteles::session::PrintSession;
//! use carteles::template::InMemoryTemplateStore;
//!
//! # async fn example() -> Result<(), carteles::CartelError> {
//! let catalog = InMemoryCatalog::new([Product::new("P1", "Widget", 1000.0)]);
//! let mut session = PrintSession::from_config(
//!     EngineConfig::default(),
//!     Arc::new(InMemoryTemplateStore::builtin()),
//!     Arc::new(catalog),
//! )?;
//!
//! session.edit_field("P1", "precioActual", "1200")?;
//!
//! let config = PrintConfiguration::new("oferta", "porcentaje", ["P1"]);
//! let mut surface = HtmlFileSurface::new("print-jobs");
//! session
//!     .confirm_print(&config, "Precio acordado con el proveedor", &mut surface)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::audit::{
    AuditGate, ChangeReport, LogReportSender, PrintDecision, ReportSender, WebhookReportSender,
    send_with_timeout,
};
use crate::catalog::{Product, ProductCatalog};
use crate::config::EngineConfig;
use crate::document::{
    AssetProbe, DocumentGenerator, HttpAssetProbe, PrintConfiguration, PrintDocument,
};
use crate::error::CartelError;
use crate::fields::{FieldId, FieldRegistry, FieldSet, normalize_field_id};
use crate::ledger::{ChangeLedger, ChangeOutcome};
use crate::print::{PrintExecutor, PrintOutcome, PrintSurface};
use crate::resolve::{ResolvedField, ValueResolver};
use crate::template::TemplateStore;
use crate::value::FieldValue;

/// What a completed print produced.
#[derive(Debug, Clone, Serialize)]
pub struct PrintReceipt {
    pub outcome: PrintOutcome,
    /// The delivered change report, when edited values were printed.
    pub report: Option<ChangeReport>,
}

/// Coordinates editing and printing for one working session.
///
/// A clone is a snapshot: it copies the ledger and shares the collaborators.
#[derive(Clone)]
pub struct PrintSession {
    config: EngineConfig,
    registry: FieldRegistry,
    store: Arc<dyn TemplateStore>,
    catalog: Arc<dyn ProductCatalog>,
    probe: Arc<dyn AssetProbe>,
    reporter: Arc<dyn ReportSender>,
    resolver: ValueResolver,
    gate: AuditGate,
    executor: PrintExecutor,
    ledger: ChangeLedger,
}

impl PrintSession {
    /// A session with explicit collaborators.
    ///
    /// Fails with `CartelError::Config` when `config` does not validate.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn TemplateStore>,
        catalog: Arc<dyn ProductCatalog>,
        probe: Arc<dyn AssetProbe>,
        reporter: Arc<dyn ReportSender>,
    ) -> Result<Self, CartelError> {
        config.validate()?;
        Ok(Self {
            registry: FieldRegistry::builtin(),
            resolver: ValueResolver::for_today(config.resolver.clone()),
            gate: AuditGate::from_config(&config.audit),
            executor: PrintExecutor::from_config(&config.print),
            store,
            catalog,
            probe,
            reporter,
            ledger: ChangeLedger::new(),
            config,
        })
    }

    /// A session using HTTP asset probing and the configured report sink
    /// (webhook when set, log otherwise).
    pub fn from_config(
        config: EngineConfig,
        store: Arc<dyn TemplateStore>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Result<Self, CartelError> {
        config.validate()?;
        let reporter: Arc<dyn ReportSender> = match &config.audit.report_webhook {
            Some(url) => Arc::new(WebhookReportSender::new(url.clone())?),
            None => Arc::new(LogReportSender),
        };
        let probe = Arc::new(HttpAssetProbe::new()?);
        Self::new(config, store, catalog, probe, reporter)
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resolve against a fixed date instead of today.
    pub fn with_resolver(mut self, resolver: ValueResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn TemplateStore {
        self.store.as_ref()
    }

    pub fn catalog(&self) -> &dyn ProductCatalog {
        self.catalog.as_ref()
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    fn product(&self, product_id: &str) -> Result<Product, CartelError> {
        self.catalog
            .product(product_id)
            .ok_or_else(|| CartelError::Catalog(format!("Unknown product '{}'", product_id)))
    }

    // ========================================================================
    // FIELDS AND VALUES
    // ========================================================================

    pub fn field_set(&self, family: &str, variant: &str) -> Result<FieldSet, CartelError> {
        self.registry.field_set(self.store.as_ref(), family, variant)
    }

    /// Effective values of every field a variant shows, for one product.
    pub fn values(
        &self,
        product_id: &str,
        family: &str,
        variant: &str,
    ) -> Result<Vec<ResolvedField>, CartelError> {
        let product = self.product(product_id)?;
        let fields = self.field_set(family, variant)?;
        Ok(self.resolver.resolve_all(&fields, &product, &self.ledger))
    }

    // ========================================================================
    // EDITS
    // ========================================================================

    /// Apply a user edit typed as text.
    ///
    /// The original is the unedited value, so typing it back reverts the
    /// field.
    pub fn edit_field(
        &mut self,
        product_id: &str,
        field: &str,
        input: &str,
    ) -> Result<ChangeOutcome, CartelError> {
        let id = normalize_field_id(field)
            .ok_or_else(|| CartelError::UnknownField(field.to_string()))?;
        let product = self.product(product_id)?;
        let value = FieldValue::parse(id.value_type(), input).map_err(|reason| {
            CartelError::InvalidValue {
                field: id.to_string(),
                value: input.to_string(),
                reason,
            }
        })?;
        let original = self.resolver.original(&product, id);
        Ok(self
            .ledger
            .track_change(&product.id, &product.name, id, original, value))
    }

    pub fn revert_field(&mut self, product_id: &str, field: FieldId) -> bool {
        self.ledger.revert_field(product_id, field)
    }

    /// Drop a product from the working set, discarding its edits.
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        self.ledger.remove_product_changes(product_id)
    }

    /// Keep only the edits of products still in the working set.
    pub fn retain_products(&mut self, working_set: &[String]) -> usize {
        self.ledger.prune_to(working_set)
    }

    pub fn clear_all(&mut self) {
        self.ledger.clear_all();
    }

    // ========================================================================
    // PRINTING
    // ========================================================================

    /// Whether printing the selection needs a justification.
    ///
    /// Dropping the returned decision cancels with no side effects.
    pub fn request_print(&self, selected: &[String]) -> PrintDecision {
        self.gate.request_print(&self.ledger, selected)
    }

    /// Build the document without printing it.
    pub async fn preview(&self, config: &PrintConfiguration) -> Result<PrintDocument, CartelError> {
        let generator = DocumentGenerator {
            registry: &self.registry,
            store: self.store.as_ref(),
            catalog: self.catalog.as_ref(),
            probe: self.probe.as_ref(),
            layout: &self.config.layout,
            assets: &self.config.assets,
        };
        generator.generate(config, &self.resolver, &self.ledger).await
    }

    /// Print a selection that has no edits.
    ///
    /// Fails with `JustificationTooShort` when the selection is edited.
    pub async fn print_direct(
        &self,
        config: &PrintConfiguration,
        surface: &mut dyn PrintSurface,
    ) -> Result<PrintReceipt, CartelError> {
        if let PrintDecision::RequireJustification(pending) =
            self.request_print(&config.selected_products)
        {
            return Err(CartelError::JustificationTooShort {
                min: pending.min_justification_chars(),
                actual: 0,
            });
        }
        self.print(config, surface, None).await
    }

    /// Print a selection, justifying its edits if it has any.
    ///
    /// With edits: the justification is validated and the change report is
    /// delivered before anything is generated or printed. A report failure
    /// aborts with `ReportSendFailed` and leaves the surface untouched.
    pub async fn confirm_print(
        &self,
        config: &PrintConfiguration,
        justification: &str,
        surface: &mut dyn PrintSurface,
    ) -> Result<PrintReceipt, CartelError> {
        // Setup errors surface before any report goes out.
        self.field_set(&config.template_family, &config.template_variant)?;

        let pending = match self.request_print(&config.selected_products) {
            PrintDecision::ProceedDirect => return self.print(config, surface, None).await,
            PrintDecision::RequireJustification(pending) => pending,
        };

        let approval = pending.approve(
            justification,
            &config.template_family,
            &config.template_variant,
        )?;
        send_with_timeout(
            self.reporter.as_ref(),
            &approval.report,
            self.config.audit.report_timeout(),
        )
        .await?;

        info!(
            report = %approval.report.id,
            products = approval.report.edited_products.len(),
            "justified print approved"
        );
        self.print(config, surface, Some(approval.report)).await
    }

    async fn print(
        &self,
        config: &PrintConfiguration,
        surface: &mut dyn PrintSurface,
        report: Option<ChangeReport>,
    ) -> Result<PrintReceipt, CartelError> {
        let document = self.preview(config).await?;
        let outcome = self.executor.execute(surface, &document).await?;
        Ok(PrintReceipt { outcome, report })
    }
}
