//! Template store: supplies assembled templates by family and variant.
//!
//! The engine only reads template structure. [`InMemoryTemplateStore`] ships
//! the built-in cartel layouts and can load more from a directory of JSON
//! files (one [`Template`] per file).

use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::{NodeStyle, Template, TemplateNode};
use crate::catalog::Product;
use crate::error::CartelError;

/// Source of assembled templates.
pub trait TemplateStore: Send + Sync {
    /// The template for a family/variant, if one exists.
    fn template(&self, family: &str, variant: &str) -> Option<Template>;

    /// Every (family, variant) pair the store knows.
    fn variants(&self) -> Vec<(String, String)>;

    /// The template able to render `product`.
    ///
    /// `None` when the variant is unknown or has no renderer for the
    /// product's category.
    fn template_for(&self, family: &str, variant: &str, product: &Product) -> Option<Template> {
        self.template(family, variant).filter(|t| t.supports(product))
    }
}

/// Templates held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    templates: BTreeMap<(String, String), Template>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with the built-in layouts.
    pub fn builtin() -> Self {
        let mut store = Self::new();
        for template in builtin_templates() {
            store.insert(template);
        }
        store
    }

    /// Add or replace a template.
    pub fn insert(&mut self, template: Template) {
        let key = (template.family.clone(), template.variant.clone());
        self.templates.insert(key, template);
    }

    /// Load every `*.json` file in `dir`. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CartelError> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = std::fs::read_to_string(&path)?;
            let template: Template = serde_json::from_str(&json).map_err(|e| {
                CartelError::Template(format!("{}: {}", path.display(), e))
            })?;
            info!(
                template = %template.component_id(),
                path = %path.display(),
                "loaded template"
            );
            self.insert(template);
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn template(&self, family: &str, variant: &str) -> Option<Template> {
        self.templates
            .get(&(family.to_string(), variant.to_string()))
            .cloned()
    }

    fn variants(&self) -> Vec<(String, String)> {
        self.templates.keys().cloned().collect()
    }
}

// ============================================================================
// BUILT-IN LAYOUTS
// ============================================================================

/// Validity line shared by the promotional layouts.
fn validity(y: f64) -> TemplateNode {
    TemplateNode::group(
        vec![
            TemplateNode::prefixed_field("fechasDesde", "Válido del ", NodeStyle::at(40.0, 0.0).font(16.0)),
            TemplateNode::prefixed_field("fechasHasta", "al ", NodeStyle::at(300.0, 0.0).font(16.0)),
        ],
        NodeStyle::at(0.0, y),
    )
}

/// Legal footer: code, tax-excluded price and origin.
fn footer(y: f64, with_origin: bool) -> TemplateNode {
    let mut children = vec![
        TemplateNode::prefixed_field("sap", "SAP ", NodeStyle::at(40.0, 0.0).font(14.0)),
        TemplateNode::prefixed_field(
            "precioSinImpuestos",
            "Precio sin impuestos nacionales ",
            NodeStyle::at(40.0, 22.0).font(14.0),
        ),
    ];
    if with_origin {
        children.push(TemplateNode::prefixed_field(
            "origen",
            "Origen: ",
            NodeStyle::at(40.0, 44.0).font(14.0),
        ));
    }
    TemplateNode::group(children, NodeStyle::at(0.0, y))
}

fn superprecio(variant: &str, accent: &str) -> Template {
    Template::new("superprecio", variant, 600.0, 850.0)
        .background("#ffffff")
        .node(TemplateNode::text(
            "SUPERPRECIO",
            NodeStyle::at(0.0, 30.0).size(600.0, 80.0).font(64.0).bold().center().color(accent),
        ))
        .node(TemplateNode::field(
            "nombre",
            NodeStyle::at(40.0, 160.0).size(520.0, 120.0).font(36.0).center(),
        ))
        .node(TemplateNode::field(
            "precioActual",
            NodeStyle::at(40.0, 330.0).size(520.0, 200.0).font(120.0).bold().center().color(accent),
        ))
        .node(validity(620.0))
        .node(footer(700.0, true))
}

fn oferta_porcentaje() -> Template {
    Template::new("oferta", "porcentaje", 600.0, 850.0)
        .background("#fff7d6")
        .node(TemplateNode::field(
            "porcentajeDescuento",
            NodeStyle::at(0.0, 30.0).size(600.0, 140.0).font(110.0).bold().center().color("#d40000"),
        ))
        .node(TemplateNode::text("OFF", NodeStyle::at(0.0, 170.0).size(600.0, 50.0).font(40.0).center()))
        .node(TemplateNode::field(
            "producto.nombre",
            NodeStyle::at(40.0, 240.0).size(520.0, 100.0).font(32.0).center(),
        ))
        .node(TemplateNode::prefixed_field(
            "precioAnterior",
            "Antes ",
            NodeStyle::at(40.0, 360.0).size(520.0, 40.0).font(28.0).center(),
        ))
        .node(TemplateNode::field(
            "precioActual",
            NodeStyle::at(40.0, 410.0).size(520.0, 160.0).font(100.0).bold().center(),
        ))
        .node(validity(620.0))
        .node(footer(700.0, true))
}

fn oferta_antes_ahora() -> Template {
    Template::new("oferta", "antes_ahora", 600.0, 850.0)
        .background("#fff7d6")
        .node(TemplateNode::field(
            "nombre",
            NodeStyle::at(40.0, 40.0).size(520.0, 120.0).font(36.0).center(),
        ))
        .node(TemplateNode::prefixed_field(
            "old_price",
            "Antes ",
            NodeStyle::at(40.0, 200.0).size(520.0, 60.0).font(40.0).center(),
        ))
        .node(TemplateNode::prefixed_field(
            "precioActual",
            "Ahora ",
            NodeStyle::at(40.0, 300.0).size(520.0, 200.0).font(110.0).bold().center().color("#d40000"),
        ))
        .node(validity(620.0))
        .node(footer(700.0, true))
}

fn precio_regular() -> Template {
    Template::new("precio_regular", "simple", 850.0, 600.0)
        .background("#ffffff")
        .node(TemplateNode::field(
            "product_name",
            NodeStyle::at(40.0, 40.0).size(770.0, 90.0).font(40.0),
        ))
        .node(TemplateNode::field("brand", NodeStyle::at(40.0, 140.0).font(24.0)))
        .node(TemplateNode::field(
            "price",
            NodeStyle::at(40.0, 200.0).size(770.0, 200.0).font(130.0).bold(),
        ))
        .node(TemplateNode::group(
            vec![
                TemplateNode::prefixed_field("sku", "SAP ", NodeStyle::at(40.0, 0.0).font(14.0)),
                TemplateNode::prefixed_field(
                    "price_without_tax",
                    "Precio sin impuestos nacionales ",
                    NodeStyle::at(40.0, 22.0).font(14.0),
                ),
                TemplateNode::prefixed_field("origin", "Origen: ", NodeStyle::at(40.0, 44.0).font(14.0)),
            ],
            NodeStyle::at(0.0, 460.0),
        ))
}

fn liquidacion_total() -> Template {
    Template::new("liquidacion", "total", 600.0, 850.0)
        .background("#ffe8e8")
        .node(TemplateNode::text(
            "LIQUIDACIÓN",
            NodeStyle::at(0.0, 30.0).size(600.0, 80.0).font(60.0).bold().center().color("#b00000"),
        ))
        .node(TemplateNode::field(
            "nombre",
            NodeStyle::at(40.0, 140.0).size(520.0, 100.0).font(32.0).center(),
        ))
        .node(TemplateNode::prefixed_field(
            "porcentajeDescuento",
            "-",
            NodeStyle::at(40.0, 250.0).size(520.0, 80.0).font(60.0).bold().center(),
        ))
        .node(TemplateNode::prefixed_field(
            "precioAnterior",
            "Antes ",
            NodeStyle::at(40.0, 350.0).size(520.0, 40.0).font(28.0).center(),
        ))
        .node(TemplateNode::field(
            "precioActual",
            NodeStyle::at(40.0, 400.0).size(520.0, 160.0).font(100.0).bold().center(),
        ))
        .node(TemplateNode::prefixed_field(
            "fechasHasta",
            "Hasta el ",
            NodeStyle::at(40.0, 620.0).font(16.0),
        ))
        .node(footer(700.0, false))
}

/// Every built-in layout.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        superprecio("clasico", "#e30613"),
        superprecio("destacado", "#0033a0"),
        oferta_porcentaje(),
        oferta_antes_ahora(),
        precio_regular(),
        liquidacion_total(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldRegistry, introspect};

    #[test]
    fn test_builtin_store_covers_every_registered_variant() {
        let store = InMemoryTemplateStore::builtin();
        let registry = FieldRegistry::builtin();
        for (family, config) in registry.families() {
            for variant in &config.variants {
                assert!(
                    store.template(family, variant).is_some(),
                    "missing template {}/{}",
                    family,
                    variant
                );
            }
        }
    }

    #[test]
    fn test_builtin_bindings_match_registry_fallback() {
        let store = InMemoryTemplateStore::builtin();
        let registry = FieldRegistry::builtin();
        for (family, variant) in store.variants() {
            let template = store.template(&family, &variant).unwrap();
            let mut found: Vec<_> = introspect(&template).ids().collect();
            let mut expected: Vec<_> = registry.fallback(&family, &variant).unwrap().ids().collect();
            found.sort();
            expected.sort();
            assert_eq!(found, expected, "{}/{}", family, variant);
        }
    }

    #[test]
    fn test_template_for_respects_categories() {
        let mut store = InMemoryTemplateStore::new();
        store.insert(Template::new("superprecio", "bebidas", 600.0, 850.0).only_categories(&["Bebidas"]));
        let soda = Product::new("P1", "Gaseosa", 1500.0).category("bebidas");
        let rice = Product::new("P2", "Arroz", 900.0).category("Almacén");
        assert!(store.template_for("superprecio", "bebidas", &soda).is_some());
        assert!(store.template_for("superprecio", "bebidas", &rice).is_none());
    }

    #[test]
    fn test_load_dir_reads_json_templates() {
        let dir = tempfile::tempdir().unwrap();
        let template = Template::new("oferta", "flash", 500.0, 500.0)
            .node(TemplateNode::field("precioActual", NodeStyle::default()));
        std::fs::write(
            dir.path().join("flash.json"),
            serde_json::to_string(&template).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut store = InMemoryTemplateStore::new();
        assert_eq!(store.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(store.template("oferta", "flash"), Some(template));
    }

    #[test]
    fn test_load_dir_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{\"family\": 1}").unwrap();
        let mut store = InMemoryTemplateStore::new();
        let err = store.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CartelError::Template(msg) if msg.contains("bad.json")));
    }
}
