//! # Print Document Generator
//!
//! Turns a [`PrintConfiguration`] into a paginated HTML [`PrintDocument`]:
//! one page per selected product, the template canvas scaled to the page,
//! an optional header band and financing banner, and explicit page-break
//! markers between pages.
//!
//! ## Pipeline
//!
//! ```text
//! selected ids ──► catalog lookup ──► template_for(product)
//!                                         │
//!            ┌────────────────────────────┴───────────────┐
//!            ▼                                            ▼
//!     resolve every field                        error placeholder
//!            │                                   (name, SKU, component)
//!            ▼
//!  probe assets once (header, art, photos; bounded)
//!            ▼
//!  render pages ──► join with page breaks ──► PrintDocument
//! ```
//!
//! A product that cannot be rendered degrades its own page; it never aborts
//! the batch. An unknown family or an empty field set does, since both are
//! configuration defects.
//!
//! ## Submodules
//!
//! - [`page`]: physical page formats
//! - [`layout`]: canvas-to-page scaling
//! - [`assets`]: bounded image availability checks
//! - [`render`]: HTML output

pub mod assets;
pub mod layout;
pub mod page;
pub mod render;

pub use assets::{AssetProbe, AssetReport, HttpAssetProbe, StaticAssetProbe};
pub use page::{PageFormat, PageSize};
pub use render::{Header, PAGE_BREAK};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{Product, ProductCatalog};
use crate::config::{AssetConfig, LayoutConfig};
use crate::error::CartelError;
use crate::fields::{FieldId, FieldRegistry};
use crate::ledger::ChangeLedger;
use crate::resolve::{ResolvedField, ValueResolver};
use crate::template::{Template, TemplateStore};
use render::PageContext;

/// A financing offer printed on every cartel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingOption {
    pub bank: String,
    pub installments: u32,
    #[serde(default)]
    pub interest_free: bool,
}

impl FinancingOption {
    pub fn label(&self) -> String {
        let plan = if self.interest_free {
            format!("{} cuotas sin interés", self.installments)
        } else {
            format!("{} cuotas", self.installments)
        };
        if self.bank.is_empty() {
            plan
        } else {
            format!("{}: {}", self.bank, plan)
        }
    }
}

fn default_true() -> bool {
    true
}

/// What to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintConfiguration {
    /// Product ids, in page order.
    pub selected_products: Vec<String>,
    pub template_family: String,
    pub template_variant: String,
    #[serde(default)]
    pub page_format: PageFormat,
    #[serde(default)]
    pub financing_options: Vec<FinancingOption>,
    #[serde(default = "default_true")]
    pub page_break_per_product: bool,
}

impl PrintConfiguration {
    pub fn new<I, S>(family: impl Into<String>, variant: impl Into<String>, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_products: products.into_iter().map(Into::into).collect(),
            template_family: family.into(),
            template_variant: variant.into(),
            page_format: PageFormat::default(),
            financing_options: Vec::new(),
            page_break_per_product: true,
        }
    }

    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.page_format = format;
        self
    }

    pub fn financing(mut self, option: FinancingOption) -> Self {
        self.financing_options.push(option);
        self
    }

    pub fn page_break_per_product(mut self, enabled: bool) -> Self {
        self.page_break_per_product = enabled;
        self
    }
}

/// A product with every field of the active set resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableUnit {
    pub product: Product,
    pub template_variant: String,
    pub resolved_field_values: Vec<ResolvedField>,
    pub page_index: usize,
}

impl PrintableUnit {
    pub fn value(&self, field: FieldId) -> Option<&ResolvedField> {
        self.resolved_field_values
            .iter()
            .find(|r| r.descriptor.field == field)
    }
}

/// Diagnostics shown on a page whose product could not be rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPlaceholder {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub missing_component: String,
    pub page_index: usize,
}

/// What a page shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    Cartel(PrintableUnit),
    Placeholder(ErrorPlaceholder),
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub content: PageContent,
    pub markup: String,
}

impl DocumentPage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, PageContent::Placeholder(_))
    }

    pub fn product_id(&self) -> &str {
        match &self.content {
            PageContent::Cartel(unit) => &unit.product.id,
            PageContent::Placeholder(p) => &p.product_id,
        }
    }
}

/// A complete printable document.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintDocument {
    pub title: String,
    pub pages: Vec<DocumentPage>,
    pub styles: String,
    /// Image sources referenced by the markup.
    pub images: Vec<String>,
    pub header: Header,
    pub page_break_per_product: bool,
}

impl PrintDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn units(&self) -> impl Iterator<Item = &PrintableUnit> {
        self.pages.iter().filter_map(|p| match &p.content {
            PageContent::Cartel(unit) => Some(unit),
            PageContent::Placeholder(_) => None,
        })
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &ErrorPlaceholder> {
        self.pages.iter().filter_map(|p| match &p.content {
            PageContent::Placeholder(placeholder) => Some(placeholder),
            PageContent::Cartel(_) => None,
        })
    }

    /// Page markup, joined with break markers (none after the last page).
    pub fn body(&self) -> String {
        let separator = if self.page_break_per_product {
            PAGE_BREAK
        } else {
            ""
        };
        self.pages
            .iter()
            .map(|p| p.markup.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Full standalone HTML document.
    pub fn to_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            html_escape::encode_text(&self.title),
            self.styles,
            self.body()
        )
    }
}

/// Everything the generator reads. Borrowed, never mutated.
pub struct DocumentGenerator<'a> {
    pub registry: &'a FieldRegistry,
    pub store: &'a dyn TemplateStore,
    pub catalog: &'a dyn ProductCatalog,
    pub probe: &'a dyn AssetProbe,
    pub layout: &'a LayoutConfig,
    pub assets: &'a AssetConfig,
}

enum Plan {
    Cartel(Product, Template),
    Missing(ErrorPlaceholder),
}

impl DocumentGenerator<'_> {
    /// Build the document for `config`, with values resolved against `ledger`.
    pub async fn generate(
        &self,
        config: &PrintConfiguration,
        resolver: &ValueResolver,
        ledger: &ChangeLedger,
    ) -> Result<PrintDocument, CartelError> {
        let family = config.template_family.as_str();
        let variant = config.template_variant.as_str();
        let fields = self.registry.field_set(self.store, family, variant)?;

        let plans: Vec<Plan> = config
            .selected_products
            .iter()
            .enumerate()
            .map(|(page_index, id)| self.plan(family, variant, id, page_index))
            .collect();

        let mut sources: Vec<&str> = Vec::new();
        if let Some(src) = self.layout.header_asset.as_deref() {
            sources.push(src);
        }
        for plan in &plans {
            if let Plan::Cartel(product, template) = plan {
                sources.extend(template.artwork_sources());
                sources.extend(product.image.as_deref());
            }
        }
        let report = assets::preload(self.probe, sources, self.assets).await;

        let header = self.header(&report);
        let page = config.page_format.size();
        let ctx = PageContext {
            page,
            header: &header,
            financing: &config.financing_options,
            assets: &report,
        };

        let pages: Vec<DocumentPage> = plans
            .into_iter()
            .enumerate()
            .map(|(page_index, plan)| match plan {
                Plan::Cartel(product, template) => {
                    let unit = PrintableUnit {
                        resolved_field_values: resolver.resolve_all(&fields, &product, ledger),
                        product,
                        template_variant: template.variant.clone(),
                        page_index,
                    };
                    let placement =
                        layout::place(template.canvas, page, header.height_px(), self.layout);
                    let markup = render::render_cartel(&ctx, &unit, &template, placement);
                    DocumentPage {
                        content: PageContent::Cartel(unit),
                        markup,
                    }
                }
                Plan::Missing(placeholder) => DocumentPage {
                    markup: render::render_placeholder(&ctx, &placeholder),
                    content: PageContent::Placeholder(placeholder),
                },
            })
            .collect();

        let document = PrintDocument {
            title: format!("Carteles {}/{}", family, variant),
            styles: render::stylesheet(config.page_format),
            images: report.available().map(String::from).collect(),
            pages,
            header,
            page_break_per_product: config.page_break_per_product,
        };

        info!(
            family,
            variant,
            pages = document.page_count(),
            placeholders = document.placeholders().count(),
            "print document generated"
        );
        Ok(document)
    }

    fn plan(&self, family: &str, variant: &str, id: &str, page_index: usize) -> Plan {
        let Some(product) = self.catalog.product(id) else {
            warn!(product_id = id, "product not in catalog, page replaced by placeholder");
            return Plan::Missing(ErrorPlaceholder {
                product_id: id.to_string(),
                product_name: id.to_string(),
                sku: String::new(),
                missing_component: format!("catalog/{}", id),
                page_index,
            });
        };

        match self.store.template_for(family, variant, &product) {
            Some(template) => Plan::Cartel(product, template),
            None => {
                let err = CartelError::MissingTemplateComponent {
                    product_id: product.id.clone(),
                    component: format!("{}/{}", family, variant),
                };
                warn!(error = %err, "page replaced by placeholder");
                Plan::Missing(ErrorPlaceholder {
                    product_id: product.id,
                    product_name: product.name,
                    sku: product.sku,
                    missing_component: format!("{}/{}", family, variant),
                    page_index,
                })
            }
        }
    }

    fn header(&self, report: &AssetReport) -> Header {
        let Some(src) = self.layout.header_asset.as_deref() else {
            return Header::None;
        };
        let height_px = PageSize::mm_to_px(self.layout.header_height_mm);
        if report.is_available(src) {
            Header::Artwork {
                src: src.to_string(),
                height_px,
            }
        } else {
            warn!(src, "header artwork unavailable, using text banner");
            Header::Banner {
                text: self.layout.header_fallback_text.clone(),
                height_px,
            }
        }
    }
}
