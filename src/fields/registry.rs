//! Field registry: per-family fallback field sets.
//!
//! Every template family registers a base field set. A variant inherits the
//! base set unless it declares exclusions, which remove fields (a variant
//! never adds fields the family does not know about). The base set minus
//! exclusions is the fallback used when a template yields no bindings.
//! Exclusions also filter introspected bindings.
//!
//! | Family | Variants | Excluded |
//! |--------|----------|----------|
//! | `superprecio` | `clasico`, `destacado` | – |
//! | `oferta` | `porcentaje`, `antes_ahora` | `antes_ahora`: descuento |
//! | `precio_regular` | `simple` | – |
//! | `liquidacion` | `total` | `total`: origen |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::{FieldId, FieldSet, introspect};
use crate::error::CartelError;
use crate::template::TemplateStore;

/// Registry entry for one template family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Human-readable name.
    pub label: String,
    /// Fields shown by the family when a variant says nothing else.
    pub base: Vec<FieldId>,
    /// Known variants of this family.
    #[serde(default)]
    pub variants: Vec<String>,
    /// Fields removed from `base` for specific variants.
    #[serde(default)]
    pub exclusions: BTreeMap<String, Vec<FieldId>>,
}

impl FamilyConfig {
    pub fn new(label: impl Into<String>, base: &[FieldId]) -> Self {
        Self {
            label: label.into(),
            base: base.to_vec(),
            variants: Vec::new(),
            exclusions: BTreeMap::new(),
        }
    }

    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(name.into());
        self
    }

    /// Declare a variant that never shows the given fields.
    pub fn variant_excluding(mut self, name: impl Into<String>, excluded: &[FieldId]) -> Self {
        let name = name.into();
        self.variants.push(name.clone());
        self.exclusions.insert(name, excluded.to_vec());
        self
    }

    /// Fields the variant never shows.
    pub fn excluded(&self, variant: &str) -> &[FieldId] {
        self.exclusions.get(variant).map(Vec::as_slice).unwrap_or_default()
    }

    /// Base fields minus the variant's exclusions.
    pub fn fields_for(&self, variant: &str) -> FieldSet {
        FieldSet::from_ids(self.base.iter().copied()).without(self.excluded(variant))
    }
}

/// Static catalog of template families and their fallback field sets.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    families: BTreeMap<String, FamilyConfig>,
}

impl FieldRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in retail families.
    pub fn builtin() -> Self {
        use FieldId::*;

        let families = [
            (
                "superprecio",
                FamilyConfig::new(
                    "Superprecio",
                    &[Nombre, PrecioActual, Sap, FechasDesde, FechasHasta, PrecioSinImpuestos, Origen],
                )
                .variant("clasico")
                .variant("destacado"),
            ),
            (
                "oferta",
                FamilyConfig::new(
                    "Oferta",
                    &[
                        Nombre,
                        PrecioActual,
                        PrecioAnterior,
                        PorcentajeDescuento,
                        Sap,
                        FechasDesde,
                        FechasHasta,
                        PrecioSinImpuestos,
                        Origen,
                    ],
                )
                .variant("porcentaje")
                .variant_excluding("antes_ahora", &[PorcentajeDescuento]),
            ),
            (
                "precio_regular",
                FamilyConfig::new(
                    "Precio regular",
                    &[Nombre, Marca, PrecioActual, Sap, PrecioSinImpuestos, Origen],
                )
                .variant("simple"),
            ),
            (
                "liquidacion",
                FamilyConfig::new(
                    "Liquidación",
                    &[
                        Nombre,
                        PrecioActual,
                        PrecioAnterior,
                        PorcentajeDescuento,
                        Sap,
                        FechasHasta,
                        PrecioSinImpuestos,
                        Origen,
                    ],
                )
                .variant_excluding("total", &[Origen]),
            ),
        ];

        let mut registry = Self::new();
        for (name, config) in families {
            // Every entry above has a non-empty base set.
            if let Err(e) = registry.register(name, config) {
                tracing::error!(family = name, error = %e, "built-in family rejected");
            }
        }
        registry
    }

    /// Add or replace a family.
    ///
    /// Rejects configurations where the base set, or any variant's fallback,
    /// would be empty.
    pub fn register(
        &mut self,
        family: impl Into<String>,
        config: FamilyConfig,
    ) -> Result<(), CartelError> {
        let family = family.into();
        let empty_variant = std::iter::once(String::new())
            .chain(config.exclusions.keys().cloned())
            .find(|variant| config.fields_for(variant).is_empty());
        if let Some(variant) = empty_variant {
            return Err(CartelError::EmptyFieldSet { family, variant });
        }
        self.families.insert(family, config);
        Ok(())
    }

    pub fn family(&self, family: &str) -> Option<&FamilyConfig> {
        self.families.get(family)
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> impl Iterator<Item = (&str, &FamilyConfig)> {
        self.families.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Fallback field set for a family/variant.
    pub fn fallback(&self, family: &str, variant: &str) -> Result<FieldSet, CartelError> {
        let config = self
            .families
            .get(family)
            .ok_or_else(|| CartelError::UnknownFamily(family.to_string()))?;
        let set = config.fields_for(variant);
        if set.is_empty() {
            return Err(CartelError::EmptyFieldSet {
                family: family.to_string(),
                variant: variant.to_string(),
            });
        }
        Ok(set)
    }

    /// The fields a family/variant actually displays.
    ///
    /// Introspects the stored template and drops the variant's exclusions;
    /// when the template is missing or nothing remains, falls back to the
    /// registered set. Never returns an empty set.
    pub fn field_set(
        &self,
        store: &dyn TemplateStore,
        family: &str,
        variant: &str,
    ) -> Result<FieldSet, CartelError> {
        let config = self
            .families
            .get(family)
            .ok_or_else(|| CartelError::UnknownFamily(family.to_string()))?;

        if let Some(template) = store.template(family, variant) {
            let found = introspect(&template).without(config.excluded(variant));
            if !found.is_empty() {
                return Ok(found);
            }
        }

        debug!(family, variant, "no bindings found, using fallback field set");
        self.fallback(family, variant)
    }
}
