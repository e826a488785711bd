//! # Value Resolver
//!
//! Computes the effective value of a field for a product. Precedence:
//!
//! 1. a tracked edit in the [`ChangeLedger`]
//! 2. a direct product attribute (`nombre` → name, `sap` → SKU, ...)
//! 3. a derived default (tax-excluded price, validity window, ...)
//!
//! The resolver holds its configuration and the date it resolves against,
//! so a call is a pure function of `(product, field, ledger)`: no mutation,
//! no I/O, no clock reads.

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

use crate::catalog::Product;
use crate::config::ResolverConfig;
use crate::error::CartelError;
use crate::fields::{FieldDescriptor, FieldId, FieldSet, normalize_field_id};
use crate::ledger::ChangeLedger;
use crate::value::{FieldValue, round_cents};

/// Where a field's unedited value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// A product attribute.
    Attribute,
    /// Computed from the product and the date.
    Derived,
}

/// A field value together with its descriptor and whether it was edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
    pub value: FieldValue,
    pub edited: bool,
}

/// Resolves field values against a fixed configuration and date.
#[derive(Debug, Clone)]
pub struct ValueResolver {
    config: ResolverConfig,
    today: NaiveDate,
}

impl ValueResolver {
    pub fn new(config: ResolverConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    /// A resolver dated today (local time).
    pub fn for_today(config: ResolverConfig) -> Self {
        Self::new(config, Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn source(field: FieldId) -> ValueSource {
        match field {
            FieldId::Nombre
            | FieldId::Marca
            | FieldId::Categoria
            | FieldId::Descripcion
            | FieldId::Sap
            | FieldId::PrecioActual => ValueSource::Attribute,
            FieldId::PrecioAnterior
            | FieldId::PorcentajeDescuento
            | FieldId::PrecioSinImpuestos
            | FieldId::FechasDesde
            | FieldId::FechasHasta
            | FieldId::Origen => ValueSource::Derived,
        }
    }

    /// The effective value: the tracked edit if any, else the original.
    pub fn resolve(&self, product: &Product, field: FieldId, ledger: &ChangeLedger) -> FieldValue {
        match ledger.change_for(&product.id, field) {
            Some(change) => change.new_value.clone(),
            None => self.original(product, field),
        }
    }

    /// The unedited value, ignoring any ledger.
    pub fn original(&self, product: &Product, field: FieldId) -> FieldValue {
        let cfg = &self.config;
        match field {
            FieldId::Nombre => FieldValue::Text(product.name.clone()),
            FieldId::Marca => FieldValue::Text(product.brand.clone()),
            FieldId::Categoria => FieldValue::Text(product.category.clone()),
            FieldId::Descripcion => FieldValue::Text(product.description.clone()),
            FieldId::Sap => FieldValue::Code(product.sku.clone()),
            FieldId::PrecioActual => FieldValue::Currency(product.price),

            FieldId::PrecioAnterior => {
                let kept = 1.0 - cfg.default_discount_percent / 100.0;
                FieldValue::Currency(round_cents(product.price / kept))
            }
            FieldId::PorcentajeDescuento => FieldValue::Percentage(cfg.default_discount_percent),
            FieldId::PrecioSinImpuestos => {
                FieldValue::Currency(round_cents(product.price * cfg.tax_excluded_factor))
            }
            FieldId::FechasDesde => FieldValue::Date(self.today),
            FieldId::FechasHasta => FieldValue::Date(
                self.today
                    .checked_add_days(Days::new(u64::from(cfg.validity_days)))
                    .unwrap_or(NaiveDate::MAX),
            ),
            FieldId::Origen => FieldValue::Text(cfg.default_origin.clone()),
        }
    }

    /// Resolve a field given by any recognized identifier.
    pub fn resolve_named(
        &self,
        product: &Product,
        field: &str,
        ledger: &ChangeLedger,
    ) -> Result<FieldValue, CartelError> {
        let id = normalize_field_id(field).ok_or_else(|| CartelError::UnknownField(field.to_string()))?;
        Ok(self.resolve(product, id, ledger))
    }

    /// Resolve a field that must belong to `set`.
    pub fn resolve_in(
        &self,
        set: &FieldSet,
        product: &Product,
        field: FieldId,
        ledger: &ChangeLedger,
    ) -> Result<FieldValue, CartelError> {
        if !set.contains(field) {
            return Err(CartelError::UnknownField(field.to_string()));
        }
        Ok(self.resolve(product, field, ledger))
    }

    /// Every field of `set` for one product, in set order.
    pub fn resolve_all(
        &self,
        set: &FieldSet,
        product: &Product,
        ledger: &ChangeLedger,
    ) -> Vec<ResolvedField> {
        set.iter()
            .map(|descriptor| ResolvedField {
                descriptor: *descriptor,
                value: self.resolve(product, descriptor.field, ledger),
                edited: ledger.change_for(&product.id, descriptor.field).is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn resolver() -> ValueResolver {
        ValueResolver::new(
            ResolverConfig::default(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
    }

    fn widget() -> Product {
        Product::new("P1", "Widget", 1000.0).sku("100200").brand("Acme")
    }

    #[test]
    fn test_tax_excluded_price_is_derived() {
        let value = resolver().resolve(&widget(), FieldId::PrecioSinImpuestos, &ChangeLedger::new());
        assert_eq!(value, FieldValue::Currency(830.0));
    }

    #[test]
    fn test_direct_attributes() {
        let r = resolver();
        let ledger = ChangeLedger::new();
        assert_eq!(r.resolve(&widget(), FieldId::Nombre, &ledger), FieldValue::Text("Widget".into()));
        assert_eq!(r.resolve(&widget(), FieldId::Sap, &ledger), FieldValue::Code("100200".into()));
        assert_eq!(r.resolve(&widget(), FieldId::PrecioActual, &ledger), FieldValue::Currency(1000.0));
        assert_eq!(r.resolve(&widget(), FieldId::Marca, &ledger), FieldValue::Text("Acme".into()));
    }

    #[test]
    fn test_default_validity_window() {
        let r = resolver();
        let ledger = ChangeLedger::new();
        assert_eq!(
            r.resolve(&widget(), FieldId::FechasDesde, &ledger),
            FieldValue::Date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
        );
        assert_eq!(
            r.resolve(&widget(), FieldId::FechasHasta, &ledger),
            FieldValue::Date(NaiveDate::from_ymd_opt(2026, 10, 26).unwrap())
        );
    }

    #[test]
    fn test_prior_price_matches_default_discount() {
        let value = resolver().resolve(&widget(), FieldId::PrecioAnterior, &ChangeLedger::new());
        assert_eq!(value, FieldValue::Currency(1250.0));
    }

    #[test]
    fn test_tracked_edit_wins() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change_at(
            "P1",
            "Widget",
            FieldId::PrecioActual,
            FieldValue::Currency(1000.0),
            FieldValue::Currency(1200.0),
            Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
        );
        let r = resolver();
        assert_eq!(r.resolve(&widget(), FieldId::PrecioActual, &ledger), FieldValue::Currency(1200.0));
        // Derived defaults follow the catalog price, not the edit.
        assert_eq!(
            r.resolve(&widget(), FieldId::PrecioSinImpuestos, &ledger),
            FieldValue::Currency(830.0)
        );
        assert_eq!(r.original(&widget(), FieldId::PrecioActual), FieldValue::Currency(1000.0));
    }

    #[test]
    fn test_resolve_named_and_unknown() {
        let r = resolver();
        let ledger = ChangeLedger::new();
        assert_eq!(
            r.resolve_named(&widget(), "product.price", &ledger).unwrap(),
            FieldValue::Currency(1000.0)
        );
        assert!(matches!(
            r.resolve_named(&widget(), "colorFavorito", &ledger),
            Err(CartelError::UnknownField(_))
        ));
    }

    #[test]
    fn test_resolve_in_rejects_field_outside_set() {
        let r = resolver();
        let set = FieldSet::from_ids([FieldId::Nombre]);
        assert!(r.resolve_in(&set, &widget(), FieldId::Nombre, &ChangeLedger::new()).is_ok());
        assert!(matches!(
            r.resolve_in(&set, &widget(), FieldId::Origen, &ChangeLedger::new()),
            Err(CartelError::UnknownField(_))
        ));
    }

    #[test]
    fn test_resolve_all_flags_edits() {
        let mut ledger = ChangeLedger::new();
        ledger.track_change(
            "P1",
            "Widget",
            FieldId::Nombre,
            FieldValue::Text("Widget".into()),
            FieldValue::Text("Widget XL".into()),
        );
        let set = FieldSet::from_ids([FieldId::Nombre, FieldId::Sap]);
        let resolved = resolver().resolve_all(&set, &widget(), &ledger);
        assert_eq!(resolved.len(), 2);
        assert!(resolved[0].edited);
        assert_eq!(resolved[0].value, FieldValue::Text("Widget XL".into()));
        assert!(!resolved[1].edited);
    }

    proptest! {
        #[test]
        fn prop_resolve_is_pure(price in 0.0f64..1_000_000.0, idx in 0usize..FieldId::ALL.len(), edited in proptest::option::of(0.0f64..1000.0)) {
            let r = resolver();
            let product = Product::new("P1", "Widget", price);
            let field = FieldId::ALL[idx];
            let mut ledger = ChangeLedger::new();
            if let Some(n) = edited {
                ledger.track_change("P1", "Widget", FieldId::PrecioActual, FieldValue::Currency(price), FieldValue::Currency(n));
            }
            let before = ledger.clone();
            let first = r.resolve(&product, field, &ledger);
            let second = r.resolve(&product, field, &ledger);
            prop_assert_eq!(first, second);
            prop_assert_eq!(before, ledger);
        }
    }
}
