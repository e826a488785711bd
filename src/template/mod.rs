//! # Template Model
//!
//! An assembled cartel template: a canvas size plus a tree of nodes. The same
//! types serve Rust construction and JSON files from the template store.
//!
//! ```
//! use carteles::template::Template;
//!
//! let json = r#"{
//!     "family": "oferta",
//!     "variant": "porcentaje",
//!     "canvas": {"width": 600, "height": 850},
//!     "nodes": [
//!         {"type": "dynamic_field", "field": "producto.nombre"},
//!         {"type": "text", "content": "OFERTA"}
//!     ]
//! }"#;
//! let template: Template = serde_json::from_str(json).unwrap();
//! assert_eq!(template.nodes.len(), 2);
//! ```

pub mod store;

pub use store::{InMemoryTemplateStore, TemplateStore};

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Native canvas size of a template, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Absolute placement and text styling of a node on the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub bold: bool,
    /// "left", "center", "right".
    #[serde(default)]
    pub align: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl NodeStyle {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn font(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn center(mut self) -> Self {
        self.align = Some("center".into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A node that displays one product field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBinding {
    /// Bound field identifier, canonical, legacy or namespaced.
    pub field: String,
    /// Text placed before the value (e.g. "Antes ").
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub style: NodeStyle,
}

/// Fixed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticText {
    pub content: String,
    #[serde(default)]
    pub style: NodeStyle,
}

/// Fixed artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub src: String,
    #[serde(default)]
    pub style: NodeStyle,
}

/// The product's own photo, when it has one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPhoto {
    #[serde(default)]
    pub style: NodeStyle,
}

/// A positioned container of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub style: NodeStyle,
}

/// One node of a template tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateNode {
    DynamicField(FieldBinding),
    Text(StaticText),
    Image(Artwork),
    ProductPhoto(ProductPhoto),
    Group(Group),
}

impl TemplateNode {
    pub fn field(field: impl Into<String>, style: NodeStyle) -> Self {
        TemplateNode::DynamicField(FieldBinding {
            field: field.into(),
            prefix: None,
            style,
        })
    }

    pub fn prefixed_field(
        field: impl Into<String>,
        prefix: impl Into<String>,
        style: NodeStyle,
    ) -> Self {
        TemplateNode::DynamicField(FieldBinding {
            field: field.into(),
            prefix: Some(prefix.into()),
            style,
        })
    }

    pub fn text(content: impl Into<String>, style: NodeStyle) -> Self {
        TemplateNode::Text(StaticText {
            content: content.into(),
            style,
        })
    }

    pub fn group(children: Vec<TemplateNode>, style: NodeStyle) -> Self {
        TemplateNode::Group(Group { children, style })
    }

    /// Depth-first visit of this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a TemplateNode)) {
        visit(self);
        if let TemplateNode::Group(group) = self {
            for child in &group.children {
                child.walk(visit);
            }
        }
    }
}

/// An assembled template variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub family: String,
    pub variant: String,
    pub canvas: Canvas,
    #[serde(default)]
    pub nodes: Vec<TemplateNode>,
    /// Background color of the canvas.
    #[serde(default)]
    pub background: Option<String>,
    /// Product categories this variant can render. Empty means all.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Template {
    pub fn new(
        family: impl Into<String>,
        variant: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            family: family.into(),
            variant: variant.into(),
            canvas: Canvas { width, height },
            nodes: Vec::new(),
            background: None,
            categories: Vec::new(),
        }
    }

    pub fn node(mut self, node: TemplateNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    pub fn only_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Identifier used in diagnostics.
    pub fn component_id(&self) -> String {
        format!("{}/{}", self.family, self.variant)
    }

    /// Whether this variant has a renderer for the product.
    pub fn supports(&self, product: &Product) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&product.category))
    }

    /// Depth-first visit of every node.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a TemplateNode)) {
        for node in &self.nodes {
            node.walk(&mut visit);
        }
    }

    /// Every fixed artwork source referenced by the tree.
    pub fn artwork_sources(&self) -> Vec<&str> {
        let mut sources = Vec::new();
        self.walk(|node| {
            if let TemplateNode::Image(art) = node {
                sources.push(art.src.as_str());
            }
        });
        sources
    }
}
