//! # Change Ledger
//!
//! Per-product record of field-level edits made during one editing/printing
//! session. Every `(product, field)` pair moves through a small state
//! machine:
//!
//! ```text
//!               diverging edit                 edit back to original
//!  Unedited ─────────────────────► Edited ───────────────────────────► Unedited
//!                                   │  ▲
//!                                   └──┘ diverging edit (value replaced)
//! ```
//!
//! A product's [`EditedProduct`] entry is created with its first edit and
//! dropped when its last change goes away, so the ledger only ever holds
//! products with live edits. [`ChangeLedger::has_any_changes`] is derived
//! from that, never stored.
//!
//! Comparisons are type-aware (see [`FieldValue::equivalent`]): typing
//! `1000.00` over a price of `1000` is not an edit.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::fields::FieldId;
use crate::value::FieldValue;

/// One edited field of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub product_id: String,
    pub field_id: FieldId,
    pub original_value: FieldValue,
    pub new_value: FieldValue,
    pub timestamp: DateTime<Utc>,
}

/// All live edits of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedProduct {
    pub product_id: String,
    pub product_name: String,
    pub changes: Vec<FieldChange>,
}

impl EditedProduct {
    /// Always true for entries held by a ledger.
    pub fn is_edited(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn change(&self, field: FieldId) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field_id == field)
    }
}

/// What a [`ChangeLedger::track_change`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOutcome {
    /// First divergence: a change was created.
    Recorded,
    /// The field was already edited; its new value was replaced.
    Updated,
    /// The value went back to the original; the change was removed.
    Reverted,
    /// No change existed and the value equals the original.
    Unchanged,
}

/// Session-scoped record of pending edits, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLedger {
    products: BTreeMap<String, EditedProduct>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a field now shows `new_value`, timestamped now.
    pub fn track_change(
        &mut self,
        product_id: &str,
        product_name: &str,
        field: FieldId,
        original_value: FieldValue,
        new_value: FieldValue,
    ) -> ChangeOutcome {
        self.track_change_at(product_id, product_name, field, original_value, new_value, Utc::now())
    }

    /// [`track_change`](Self::track_change) with an explicit timestamp.
    ///
    /// Once a field is edited, its first recorded original stays the
    /// reference: `original_value` is only used on the first divergence.
    pub fn track_change_at(
        &mut self,
        product_id: &str,
        product_name: &str,
        field: FieldId,
        original_value: FieldValue,
        new_value: FieldValue,
        at: DateTime<Utc>,
    ) -> ChangeOutcome {
        let value_type = field.value_type();

        let outcome = match self.products.get_mut(product_id) {
            Some(entry) => {
                entry.product_name = product_name.to_string();
                match entry.changes.iter().position(|c| c.field_id == field) {
                    Some(idx) => {
                        if FieldValue::equivalent(value_type, &entry.changes[idx].original_value, &new_value) {
                            entry.changes.remove(idx);
                            ChangeOutcome::Reverted
                        } else {
                            let change = &mut entry.changes[idx];
                            change.new_value = new_value;
                            change.timestamp = at;
                            ChangeOutcome::Updated
                        }
                    }
                    None if FieldValue::equivalent(value_type, &original_value, &new_value) => {
                        ChangeOutcome::Unchanged
                    }
                    None => {
                        entry.changes.push(FieldChange {
                            product_id: product_id.to_string(),
                            field_id: field,
                            original_value,
                            new_value,
                            timestamp: at,
                        });
                        ChangeOutcome::Recorded
                    }
                }
            }
            None if FieldValue::equivalent(value_type, &original_value, &new_value) => {
                ChangeOutcome::Unchanged
            }
            None => {
                self.products.insert(
                    product_id.to_string(),
                    EditedProduct {
                        product_id: product_id.to_string(),
                        product_name: product_name.to_string(),
                        changes: vec![FieldChange {
                            product_id: product_id.to_string(),
                            field_id: field,
                            original_value,
                            new_value,
                            timestamp: at,
                        }],
                    },
                );
                ChangeOutcome::Recorded
            }
        };

        if outcome == ChangeOutcome::Reverted {
            self.drop_if_empty(product_id);
        }
        debug!(product_id, field = %field, ?outcome, "tracked change");
        outcome
    }

    /// Put one field back to its original value. Returns whether it was edited.
    pub fn revert_field(&mut self, product_id: &str, field: FieldId) -> bool {
        let Some(entry) = self.products.get_mut(product_id) else {
            return false;
        };
        let before = entry.changes.len();
        entry.changes.retain(|c| c.field_id != field);
        let removed = entry.changes.len() != before;
        self.drop_if_empty(product_id);
        removed
    }

    /// Put every field of a product back to its original value.
    pub fn remove_product_changes(&mut self, product_id: &str) -> bool {
        self.products.remove(product_id).is_some()
    }

    /// Forget every edit.
    pub fn clear_all(&mut self) {
        self.products.clear();
    }

    /// Drop edits of products no longer in the working set. Returns how many
    /// products were dropped.
    pub fn prune_to(&mut self, working_set: &[String]) -> usize {
        let before = self.products.len();
        self.products.retain(|id, _| working_set.contains(id));
        before - self.products.len()
    }

    pub fn has_any_changes(&self) -> bool {
        !self.products.is_empty()
    }

    pub fn has_changes_for(&self, product_id: &str) -> bool {
        self.products.contains_key(product_id)
    }

    pub fn product(&self, product_id: &str) -> Option<&EditedProduct> {
        self.products.get(product_id)
    }

    pub fn change_for(&self, product_id: &str, field: FieldId) -> Option<&FieldChange> {
        self.products.get(product_id)?.change(field)
    }

    /// Every product with live edits, ordered by product id.
    pub fn edited_products(&self) -> impl Iterator<Item = &EditedProduct> {
        self.products.values()
    }

    /// The edited products among `ids`, in `ids` order.
    pub fn edited_among<'a>(&'a self, ids: &'a [String]) -> impl Iterator<Item = &'a EditedProduct> + 'a {
        ids.iter().filter_map(|id| self.products.get(id))
    }

    /// Number of edited fields across all products.
    pub fn edit_count(&self) -> usize {
        self.products.values().map(|p| p.changes.len()).sum()
    }

    /// Number of products with live edits.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn drop_if_empty(&mut self, product_id: &str) {
        if self.products.get(product_id).is_some_and(|p| p.changes.is_empty()) {
            self.products.remove(product_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn price(n: f64) -> FieldValue {
        FieldValue::Currency(n)
    }

    #[test]
    fn test_edit_then_revert_leaves_no_entry() {
        let mut ledger = ChangeLedger::new();
        let first = ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1000.0), price(1200.0));
        assert_eq!(first, ChangeOutcome::Recorded);
        assert!(ledger.has_any_changes());

        let second = ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1200.0), price(1000.0));
        assert_eq!(second, ChangeOutcome::Reverted);
        assert!(ledger.product("P1").is_none());
        assert!(!ledger.has_any_changes());
    }

    #[test]
    fn test_subsequent_edit_replaces_value_and_keeps_original() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1000.0), price(1200.0));
        let outcome = ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1200.0), price(1100.0));
        assert_eq!(outcome, ChangeOutcome::Updated);
        let change = ledger.change_for("P1", FieldId::PrecioActual).unwrap();
        assert_eq!(change.original_value, price(1000.0));
        assert_eq!(change.new_value, price(1100.0));
        assert_eq!(ledger.edit_count(), 1);
    }

    #[test]
    fn test_formatting_only_edit_is_not_a_change() {
        let mut ledger = ChangeLedger::new();
        let outcome = ledger.track_change(
            "P1",
            "Widget",
            FieldId::PrecioActual,
            FieldValue::Text("1000".into()),
            FieldValue::Text("1000.00".into()),
        );
        assert_eq!(outcome, ChangeOutcome::Unchanged);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_revert_one_field_keeps_others() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1000.0), price(1200.0));
        ledger.track_change(
            "P1",
            "Widget",
            FieldId::Nombre,
            FieldValue::Text("Widget".into()),
            FieldValue::Text("Widget XL".into()),
        );
        assert!(ledger.revert_field("P1", FieldId::PrecioActual));
        assert!(!ledger.revert_field("P1", FieldId::PrecioActual));
        assert!(ledger.has_changes_for("P1"));
        assert!(ledger.revert_field("P1", FieldId::Nombre));
        assert!(!ledger.has_changes_for("P1"));
    }

    #[test]
    fn test_remove_product_and_clear_all() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1000.0), price(1200.0));
        ledger.track_change("P2", "Gadget", FieldId::PrecioActual, price(500.0), price(450.0));
        assert!(ledger.remove_product_changes("P1"));
        assert!(!ledger.remove_product_changes("P1"));
        assert_eq!(ledger.len(), 1);
        ledger.clear_all();
        assert!(!ledger.has_any_changes());
    }

    #[test]
    fn test_prune_to_working_set() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change("P1", "Widget", FieldId::PrecioActual, price(1000.0), price(1200.0));
        ledger.track_change("P2", "Gadget", FieldId::PrecioActual, price(500.0), price(450.0));
        assert_eq!(ledger.prune_to(&["P2".to_string(), "P3".to_string()]), 1);
        assert!(ledger.has_changes_for("P2"));
        assert!(!ledger.has_changes_for("P1"));
    }

    #[test]
    fn test_edited_among_follows_requested_order() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change("A", "a", FieldId::PrecioActual, price(1.0), price(2.0));
        ledger.track_change("B", "b", FieldId::PrecioActual, price(1.0), price(2.0));
        let ids = vec!["B".to_string(), "X".to_string(), "A".to_string()];
        let found: Vec<_> = ledger.edited_among(&ids).map(|p| p.product_id.as_str()).collect();
        assert_eq!(found, vec!["B", "A"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Track { product: usize, field: usize, original: u8, new: u8 },
        Revert { product: usize, field: usize },
        Remove { product: usize },
        Clear,
    }

    const PRODUCTS: [&str; 3] = ["P1", "P2", "P3"];
    const FIELDS: [FieldId; 3] = [FieldId::PrecioActual, FieldId::PorcentajeDescuento, FieldId::Sap];

    fn value_for(field: FieldId, n: u8) -> FieldValue {
        match field.value_type() {
            crate::fields::ValueType::Currency => FieldValue::Currency(f64::from(n)),
            crate::fields::ValueType::Percentage => FieldValue::Percentage(f64::from(n % 100)),
            _ => FieldValue::Code(format!("C{}", n)),
        }
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0..3usize, 0..3usize, 0..4u8, 0..4u8)
                .prop_map(|(product, field, original, new)| Op::Track { product, field, original, new }),
            2 => (0..3usize, 0..3usize).prop_map(|(product, field)| Op::Revert { product, field }),
            1 => (0..3usize).prop_map(|product| Op::Remove { product }),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_flag_matches_nonempty_entries(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let mut ledger = ChangeLedger::new();
            for op in ops {
                match op {
                    Op::Track { product, field, original, new } => {
                        let field = FIELDS[field];
                        ledger.track_change(PRODUCTS[product], "x", field, value_for(field, original), value_for(field, new));
                    }
                    Op::Revert { product, field } => {
                        ledger.revert_field(PRODUCTS[product], FIELDS[field]);
                    }
                    Op::Remove { product } => {
                        ledger.remove_product_changes(PRODUCTS[product]);
                    }
                    Op::Clear => ledger.clear_all(),
                }

                let any_nonempty = ledger.edited_products().any(|p| !p.changes.is_empty());
                prop_assert_eq!(ledger.has_any_changes(), any_nonempty);
                for product in ledger.edited_products() {
                    prop_assert!(product.is_edited());
                    for change in &product.changes {
                        prop_assert!(!FieldValue::equivalent(
                            change.field_id.value_type(),
                            &change.original_value,
                            &change.new_value
                        ));
                    }
                }
            }
        }

        #[test]
        fn prop_edit_back_to_original_removes_change(original in 0u32..100_000, edited in 0u32..100_000) {
            let mut ledger = ChangeLedger::new();
            let original = FieldValue::Currency(f64::from(original));
            let edited = FieldValue::Currency(f64::from(edited));
            ledger.track_change("P1", "Widget", FieldId::PrecioActual, original.clone(), edited.clone());
            ledger.track_change("P1", "Widget", FieldId::PrecioActual, edited, original);
            prop_assert!(ledger.change_for("P1", FieldId::PrecioActual).is_none());
            prop_assert!(!ledger.has_any_changes());
        }
    }
}
