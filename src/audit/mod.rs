//! # Audit Gate
//!
//! Printing values that differ from the catalog needs a written
//! justification and a change report. The gate decides whether a print
//! request needs one:
//!
//! ```
//! use carteles::audit::{AuditGate, PrintDecision};
//! use carteles::ledger::ChangeLedger;
//!
//! let gate = AuditGate::new(10);
//! let ledger = ChangeLedger::new();
//! let selected = vec!["P1".to_string(), "P2".to_string()];
//! assert!(matches!(gate.request_print(&ledger, &selected), PrintDecision::ProceedDirect));
//! ```
//!
//! A [`PendingAudit`] holds a snapshot of the edits being printed. Dropping
//! it cancels the print with no side effects; [`PendingAudit::approve`]
//! validates the justification and builds the [`ChangeReport`] that must be
//! delivered (see [`report`]) before anything is printed.

pub mod report;

pub use report::{
    LogReportSender, RecordingReportSender, ReportSender, WebhookReportSender, send_with_timeout,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::config::AuditConfig;
use crate::error::CartelError;
use crate::fields::FieldId;
use crate::ledger::{ChangeLedger, EditedProduct};

/// Outcome of a print request.
#[derive(Debug, Clone)]
pub enum PrintDecision {
    /// Nothing selected is edited: print right away.
    ProceedDirect,
    /// Edited values are about to be printed: ask for a justification.
    RequireJustification(PendingAudit),
}

impl PrintDecision {
    pub fn requires_justification(&self) -> bool {
        matches!(self, PrintDecision::RequireJustification(_))
    }
}

/// Decides whether a print needs a justification.
#[derive(Debug, Clone, Copy)]
pub struct AuditGate {
    min_justification_chars: usize,
}

impl AuditGate {
    pub fn new(min_justification_chars: usize) -> Self {
        Self {
            min_justification_chars,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.min_justification_chars)
    }

    pub fn min_justification_chars(&self) -> usize {
        self.min_justification_chars
    }

    /// Check the selection against the ledger.
    pub fn request_print(&self, ledger: &ChangeLedger, selected: &[String]) -> PrintDecision {
        let edited: Vec<EditedProduct> = ledger.edited_among(selected).cloned().collect();
        if edited.is_empty() {
            PrintDecision::ProceedDirect
        } else {
            PrintDecision::RequireJustification(PendingAudit {
                edited,
                min_justification_chars: self.min_justification_chars,
            })
        }
    }
}

/// A print waiting for the user's justification.
#[derive(Debug, Clone)]
pub struct PendingAudit {
    edited: Vec<EditedProduct>,
    min_justification_chars: usize,
}

impl PendingAudit {
    /// The edited products that are about to be printed.
    pub fn edited_products(&self) -> &[EditedProduct] {
        &self.edited
    }

    pub fn min_justification_chars(&self) -> usize {
        self.min_justification_chars
    }

    /// Check the justification length (trimmed, in characters).
    pub fn validate(&self, justification: &str) -> Result<(), CartelError> {
        let actual = justification.trim().chars().count();
        if actual < self.min_justification_chars {
            return Err(CartelError::JustificationTooShort {
                min: self.min_justification_chars,
                actual,
            });
        }
        Ok(())
    }

    /// Accept the justification and build the change report.
    ///
    /// On error the pending audit stays usable so the user can retry.
    pub fn approve(
        &self,
        justification: &str,
        family: &str,
        variant: &str,
    ) -> Result<AuditApproval, CartelError> {
        self.approve_at(justification, family, variant, Utc::now())
    }

    pub fn approve_at(
        &self,
        justification: &str,
        family: &str,
        variant: &str,
        at: DateTime<Utc>,
    ) -> Result<AuditApproval, CartelError> {
        self.validate(justification)?;
        let justification = justification.trim().to_string();
        let report = ChangeReport {
            id: Uuid::new_v4(),
            family: family.to_string(),
            variant: variant.to_string(),
            edited_products: self.edited.iter().map(ReportedProduct::from).collect(),
            justification: justification.clone(),
            timestamp: at,
        };
        Ok(AuditApproval {
            justification,
            report,
        })
    }
}

/// A justified print, ready for report delivery.
#[derive(Debug, Clone)]
pub struct AuditApproval {
    pub justification: String,
    pub report: ChangeReport,
}

/// One edited field, as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedChange {
    pub field_id: FieldId,
    pub field_label: &'static str,
    pub original_value: String,
    pub new_value: String,
    pub edited_at: DateTime<Utc>,
}

/// One edited product, as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedProduct {
    pub product_id: String,
    pub product_name: String,
    pub is_edited: bool,
    pub changes: Vec<ReportedChange>,
}

impl From<&EditedProduct> for ReportedProduct {
    fn from(product: &EditedProduct) -> Self {
        Self {
            product_id: product.product_id.clone(),
            product_name: product.product_name.clone(),
            is_edited: product.is_edited(),
            changes: product
                .changes
                .iter()
                .map(|c| ReportedChange {
                    field_id: c.field_id,
                    field_label: c.field_id.label(),
                    original_value: c.original_value.to_string(),
                    new_value: c.new_value.to_string(),
                    edited_at: c.timestamp,
                })
                .collect(),
        }
    }
}

/// Audit record of edited values sent before printing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub id: Uuid,
    pub family: String,
    pub variant: String,
    pub edited_products: Vec<ReportedProduct>,
    pub justification: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangeReport {
    pub fn change_count(&self) -> usize {
        self.edited_products.iter().map(|p| p.changes.len()).sum()
    }

    /// Plain-text rendering for mail bodies and logs.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Carteles {}/{} impresos con {} cambio(s) ({})",
            self.family,
            self.variant,
            self.change_count(),
            self.timestamp.format("%d/%m/%Y %H:%M UTC")
        );
        let _ = writeln!(out, "Justificación: {}", self.justification);
        for product in &self.edited_products {
            let _ = writeln!(out, "- {} ({})", product.product_name, product.product_id);
            for change in &product.changes {
                let _ = writeln!(
                    out,
                    "    {}: {} -> {} [{}]",
                    change.field_label,
                    change.original_value,
                    change.new_value,
                    change.edited_at.format("%H:%M:%S")
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;
    use chrono::TimeZone;

    fn edited_ledger() -> ChangeLedger {
        let mut ledger = ChangeLedger::new();
        ledger.track_change_at(
            "P1",
            "Widget",
            FieldId::PrecioActual,
            FieldValue::Currency(1000.0),
            FieldValue::Currency(1200.0),
            Utc.with_ymd_and_hms(2026, 10, 19, 10, 30, 0).unwrap(),
        );
        ledger
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_edits_proceeds_direct() {
        let gate = AuditGate::new(10);
        let decision = gate.request_print(&ChangeLedger::new(), &ids(&["P1", "P2"]));
        assert!(matches!(decision, PrintDecision::ProceedDirect));
    }

    #[test]
    fn test_edits_outside_selection_proceed_direct() {
        let gate = AuditGate::new(10);
        let decision = gate.request_print(&edited_ledger(), &ids(&["P2"]));
        assert!(!decision.requires_justification());
    }

    #[test]
    fn test_short_justification_rejected_then_retry() {
        let gate = AuditGate::new(10);
        let PrintDecision::RequireJustification(pending) =
            gate.request_print(&edited_ledger(), &ids(&["P1", "P2"]))
        else {
            panic!("expected justification to be required");
        };

        let err = pending.approve("ab", "oferta", "porcentaje").unwrap_err();
        assert!(matches!(err, CartelError::JustificationTooShort { min: 10, actual: 2 }));

        // Padding does not count.
        assert!(pending.approve("   abc     ", "oferta", "porcentaje").is_err());

        let approval = pending
            .approve("Precio acordado con el proveedor", "oferta", "porcentaje")
            .unwrap();
        assert_eq!(approval.justification, "Precio acordado con el proveedor");
        assert_eq!(approval.report.edited_products.len(), 1);
    }

    #[test]
    fn test_report_contents() {
        let gate = AuditGate::new(10);
        let PrintDecision::RequireJustification(pending) =
            gate.request_print(&edited_ledger(), &ids(&["P1"]))
        else {
            panic!("expected justification to be required");
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap();
        let report = pending
            .approve_at("Error de carga en el sistema", "oferta", "porcentaje", at)
            .unwrap()
            .report;

        assert_eq!(report.family, "oferta");
        assert_eq!(report.timestamp, at);
        let product = &report.edited_products[0];
        assert!(product.is_edited);
        assert_eq!(product.changes[0].original_value, "$1.000");
        assert_eq!(product.changes[0].new_value, "$1.200");
        assert_eq!(
            product.changes[0].edited_at,
            Utc.with_ymd_and_hms(2026, 10, 19, 10, 30, 0).unwrap()
        );

        let summary = report.summary();
        assert!(summary.contains("Widget (P1)"));
        assert!(summary.contains("Precio actual: $1.000 -> $1.200"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["editedProducts"][0]["changes"][0]["fieldId"], "precioActual");
    }
}
