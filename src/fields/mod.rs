//! # Field Vocabulary
//!
//! The canonical set of data fields a cartel can display, their metadata,
//! and the normalization from legacy or namespaced template identifiers.
//!
//! ```
//! use carteles::fields::{FieldId, normalize_field_id};
//!
//! assert_eq!(normalize_field_id("precioActual"), Some(FieldId::PrecioActual));
//! assert_eq!(normalize_field_id("product.price"), Some(FieldId::PrecioActual));
//! assert_eq!(normalize_field_id("field:old_price"), Some(FieldId::PrecioAnterior));
//! assert_eq!(normalize_field_id("wat"), None);
//! ```
//!
//! ## Submodules
//!
//! - [`registry`]: per-family fallback field sets and variant exclusions
//! - [`introspect`]: extraction of field bindings from a template tree

pub mod introspect;
pub mod registry;

pub use introspect::introspect;
pub use registry::{FamilyConfig, FieldRegistry};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field's value is typed, parsed, compared and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    Currency,
    Percentage,
    Date,
    Code,
}

impl ValueType {
    /// Currency and percentage values compare numerically.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Currency | ValueType::Percentage)
    }
}

/// Static metadata about one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    #[serde(rename = "fieldId")]
    pub field: FieldId,
    pub label: &'static str,
    #[serde(rename = "valueType")]
    pub value_type: ValueType,
    pub required: bool,
}

/// Define `FieldId` and its metadata from a single table.
///
/// Adding a field: add one line here, then give it a product mapping or a
/// derived default in [`crate::resolve`]. The exhaustive matches there
/// will point at the spot.
macro_rules! define_fields {
    ($($variant:ident => $id:literal, $label:literal, $ty:ident, $required:literal;)+) => {
        /// Canonical field identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FieldId {
            $(#[serde(rename = $id)] $variant,)+
        }

        impl FieldId {
            /// Every canonical field, in declaration order.
            pub const ALL: &'static [FieldId] = &[$(FieldId::$variant,)+];

            /// Canonical identifier as used in templates and reports.
            pub fn as_str(self) -> &'static str {
                match self { $(FieldId::$variant => $id,)+ }
            }

            pub fn descriptor(self) -> FieldDescriptor {
                match self {
                    $(FieldId::$variant => FieldDescriptor {
                        field: self,
                        label: $label,
                        value_type: ValueType::$ty,
                        required: $required,
                    },)+
                }
            }
        }
    };
}

define_fields! {
    Nombre => "nombre", "Nombre", Text, true;
    Marca => "marca", "Marca", Text, false;
    Categoria => "categoria", "Categoría", Text, false;
    Descripcion => "descripcion", "Descripción", Text, false;
    Sap => "sap", "Código SAP", Code, true;
    PrecioActual => "precioActual", "Precio actual", Currency, true;
    PrecioAnterior => "precioAnterior", "Precio anterior", Currency, false;
    PorcentajeDescuento => "porcentajeDescuento", "Descuento", Percentage, false;
    PrecioSinImpuestos => "precioSinImpuestos", "Precio sin impuestos", Currency, true;
    FechasDesde => "fechasDesde", "Válido desde", Date, false;
    FechasHasta => "fechasHasta", "Válido hasta", Date, false;
    Origen => "origen", "Origen", Text, false;
}

impl FieldId {
    pub fn value_type(self) -> ValueType {
        self.descriptor().value_type
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldId {
    type Err = crate::error::CartelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_field_id(s).ok_or_else(|| crate::error::CartelError::UnknownField(s.to_string()))
    }
}

/// Legacy identifiers, already folded (lowercase, no separators).
const ALIASES: &[(&str, FieldId)] = &[
    ("name", FieldId::Nombre),
    ("productname", FieldId::Nombre),
    ("producto", FieldId::Nombre),
    ("titulo", FieldId::Nombre),
    ("title", FieldId::Nombre),
    ("brand", FieldId::Marca),
    ("category", FieldId::Categoria),
    ("rubro", FieldId::Categoria),
    ("description", FieldId::Descripcion),
    ("detalle", FieldId::Descripcion),
    ("sku", FieldId::Sap),
    ("codigo", FieldId::Sap),
    ("codigosap", FieldId::Sap),
    ("code", FieldId::Sap),
    ("plu", FieldId::Sap),
    ("price", FieldId::PrecioActual),
    ("precio", FieldId::PrecioActual),
    ("currentprice", FieldId::PrecioActual),
    ("newprice", FieldId::PrecioActual),
    ("precioventa", FieldId::PrecioActual),
    ("preciooferta", FieldId::PrecioActual),
    ("oldprice", FieldId::PrecioAnterior),
    ("previousprice", FieldId::PrecioAnterior),
    ("priorprice", FieldId::PrecioAnterior),
    ("listprice", FieldId::PrecioAnterior),
    ("precioantes", FieldId::PrecioAnterior),
    ("precioregular", FieldId::PrecioAnterior),
    ("discount", FieldId::PorcentajeDescuento),
    ("discountpercent", FieldId::PorcentajeDescuento),
    ("descuento", FieldId::PorcentajeDescuento),
    ("porcentaje", FieldId::PorcentajeDescuento),
    ("off", FieldId::PorcentajeDescuento),
    ("pricewithouttax", FieldId::PrecioSinImpuestos),
    ("pretaxprice", FieldId::PrecioSinImpuestos),
    ("taxexcludedprice", FieldId::PrecioSinImpuestos),
    ("preciosiniva", FieldId::PrecioSinImpuestos),
    ("precioneto", FieldId::PrecioSinImpuestos),
    ("netprice", FieldId::PrecioSinImpuestos),
    ("validfrom", FieldId::FechasDesde),
    ("startdate", FieldId::FechasDesde),
    ("desde", FieldId::FechasDesde),
    ("fechadesde", FieldId::FechasDesde),
    ("fechainicio", FieldId::FechasDesde),
    ("validto", FieldId::FechasHasta),
    ("validuntil", FieldId::FechasHasta),
    ("enddate", FieldId::FechasHasta),
    ("hasta", FieldId::FechasHasta),
    ("fechahasta", FieldId::FechasHasta),
    ("fechafin", FieldId::FechasHasta),
    ("origin", FieldId::Origen),
    ("country", FieldId::Origen),
    ("paisorigen", FieldId::Origen),
];

/// Lowercase and drop `_`, `-` and spaces.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Map a template field identifier to the canonical vocabulary.
///
/// Accepts canonical ids, legacy aliases and namespaced forms
/// (`producto.nombre`, `field:precioActual`, `cartel/sap`). Returns `None`
/// for anything unrecognized.
pub fn normalize_field_id(raw: &str) -> Option<FieldId> {
    let local = raw
        .trim()
        .rsplit(['.', ':', '/'])
        .next()
        .unwrap_or_default();
    let folded = fold(local);
    if folded.is_empty() {
        return None;
    }

    FieldId::ALL
        .iter()
        .copied()
        .find(|f| fold(f.as_str()) == folded)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == folded)
                .map(|(_, field)| *field)
        })
}

/// Ordered, duplicate-free set of fields a template variant displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSet {
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    /// Build from ids, keeping the first appearance of each.
    pub fn from_ids(ids: impl IntoIterator<Item = FieldId>) -> Self {
        let mut set = Self::default();
        for id in ids {
            set.insert(id);
        }
        set
    }

    /// Append a field unless already present. Returns whether it was added.
    pub fn insert(&mut self, id: FieldId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.fields.push(id.descriptor());
        true
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.fields.iter().any(|d| d.field == id)
    }

    /// A copy without the given fields.
    pub fn without(&self, excluded: &[FieldId]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|d| !excluded.contains(&d.field))
                .copied()
                .collect(),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.iter().map(|d| d.field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
