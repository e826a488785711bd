//! HTML rendering of cartel pages.
//!
//! Every page is a fixed-size `<section class="page">`. The template canvas
//! keeps its native pixel coordinates and is scaled with a CSS transform, so
//! node positions never need rescaling. All text goes through `html-escape`.

use std::fmt::Write as _;

use super::assets::AssetReport;
use super::layout::Placement;
use super::page::{PageFormat, PageSize};
use super::{ErrorPlaceholder, FinancingOption, PrintableUnit};
use crate::fields::normalize_field_id;
use crate::template::{NodeStyle, Template, TemplateNode};

/// Marker placed between pages when each product gets its own sheet.
pub const PAGE_BREAK: &str = r#"<div class="page-break"></div>"#;

/// Header band shown at the top of every page.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    None,
    /// The configured artwork loaded fine.
    Artwork { src: String, height_px: f64 },
    /// The artwork is missing or slow: same band, text only.
    Banner { text: String, height_px: f64 },
}

impl Header {
    pub fn height_px(&self) -> f64 {
        match self {
            Header::None => 0.0,
            Header::Artwork { height_px, .. } | Header::Banner { height_px, .. } => *height_px,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Header::Banner { .. })
    }

    fn render(&self, out: &mut String) {
        match self {
            Header::None => {}
            Header::Artwork { src, height_px } => {
                let _ = write!(
                    out,
                    r#"<div class="header" style="height:{:.1}px"><img src="{}" alt=""></div>"#,
                    height_px,
                    attr(src)
                );
            }
            Header::Banner { text, height_px } => {
                let _ = write!(
                    out,
                    r#"<div class="header header-fallback" style="height:{h:.1}px;line-height:{h:.1}px">{}</div>"#,
                    text_of(text),
                    h = height_px
                );
            }
        }
    }
}

/// Shared inputs for every page of a document.
pub struct PageContext<'a> {
    pub page: PageSize,
    pub header: &'a Header,
    pub financing: &'a [FinancingOption],
    pub assets: &'a AssetReport,
}

/// Document-wide stylesheet.
pub fn stylesheet(format: PageFormat) -> String {
    let page = format.size();
    format!(
        r#"@page {{ size: {size}; margin: 0; }}
* {{ box-sizing: border-box; }}
body {{ margin: 0; font-family: "Helvetica Neue", Arial, sans-serif; }}
.page {{ position: relative; overflow: hidden; width: {w:.1}px; height: {h:.1}px; }}
.page-break {{ break-after: page; page-break-after: always; height: 0; }}
.header {{ position: absolute; top: 0; left: 0; right: 0; overflow: hidden; text-align: center; }}
.header img {{ height: 100%; }}
.header-fallback {{ background: #c8102e; color: #fff; font-size: 42px; font-weight: bold; letter-spacing: 4px; }}
.cartel {{ position: absolute; overflow: hidden; transform-origin: top left; background: #fff; }}
.node {{ white-space: pre-wrap; }}
.financing {{ position: absolute; left: 0; right: 0; bottom: 0; padding: 8px; background: #003a70; color: #fff; font-size: 18px; text-align: center; }}
.cartel-error {{ margin: 120px 60px; padding: 24px; border: 3px dashed #c8102e; font-size: 20px; }}
.cartel-error dt {{ font-weight: bold; }}
"#,
        size = format.css_size(),
        w = page.width_px(),
        h = page.height_px()
    )
}

/// One cartel page.
pub fn render_cartel(
    ctx: &PageContext<'_>,
    unit: &PrintableUnit,
    template: &Template,
    placement: Placement,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<section class="page" data-product="{}" data-page="{}">"#,
        attr(&unit.product.id),
        unit.page_index
    );
    ctx.header.render(&mut out);

    let background = template
        .background
        .as_deref()
        .map(|c| format!("background:{};", attr(c)))
        .unwrap_or_default();
    let _ = write!(
        out,
        r#"<div class="cartel" data-template="{}" style="left:{:.1}px;top:{:.1}px;width:{}px;height:{}px;transform:scale({:.4});{}">"#,
        attr(&template.component_id()),
        placement.left,
        placement.top,
        template.canvas.width,
        template.canvas.height,
        placement.scale,
        background
    );
    for node in &template.nodes {
        render_node(&mut out, ctx, unit, node);
    }
    out.push_str("</div>");

    render_financing(&mut out, ctx.financing);
    out.push_str("</section>");
    out
}

/// A page standing in for a product that could not be rendered.
pub fn render_placeholder(ctx: &PageContext<'_>, placeholder: &ErrorPlaceholder) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<section class="page page-error" data-product="{}" data-page="{}">"#,
        attr(&placeholder.product_id),
        placeholder.page_index
    );
    ctx.header.render(&mut out);
    let _ = write!(
        out,
        concat!(
            r#"<div class="cartel-error"><h2>No se pudo generar el cartel</h2><dl>"#,
            "<dt>Producto</dt><dd>{}</dd>",
            "<dt>SAP</dt><dd>{}</dd>",
            "<dt>Componente</dt><dd>{}</dd>",
            "</dl></div>"
        ),
        text_of(&placeholder.product_name),
        text_of(&placeholder.sku),
        text_of(&placeholder.missing_component)
    );
    out.push_str("</section>");
    out
}

fn render_node(out: &mut String, ctx: &PageContext<'_>, unit: &PrintableUnit, node: &TemplateNode) {
    match node {
        TemplateNode::DynamicField(binding) => {
            // Unrecognized bindings were reported during introspection.
            let Some(resolved) = normalize_field_id(&binding.field).and_then(|id| unit.value(id))
            else {
                return;
            };
            let prefix = binding.prefix.as_deref().unwrap_or("");
            let _ = write!(
                out,
                r#"<div class="node field{}" data-field="{}" style="{}">{}{}</div>"#,
                if resolved.edited { " edited" } else { "" },
                resolved.descriptor.field,
                style_css(&binding.style),
                text_of(prefix),
                text_of(&resolved.value.to_string())
            );
        }
        TemplateNode::Text(text) => {
            let _ = write!(
                out,
                r#"<div class="node text" style="{}">{}</div>"#,
                style_css(&text.style),
                text_of(&text.content)
            );
        }
        TemplateNode::Image(art) => render_image(out, ctx, &art.src, &art.style, "art"),
        TemplateNode::ProductPhoto(photo) => {
            if let Some(src) = unit.product.image.as_deref() {
                render_image(out, ctx, src, &photo.style, "photo");
            }
        }
        TemplateNode::Group(group) => {
            let _ = write!(out, r#"<div class="node group" style="{}">"#, style_css(&group.style));
            for child in &group.children {
                render_node(out, ctx, unit, child);
            }
            out.push_str("</div>");
        }
    }
}

fn render_image(out: &mut String, ctx: &PageContext<'_>, src: &str, style: &NodeStyle, class: &str) {
    if ctx.assets.is_available(src) {
        let _ = write!(
            out,
            r#"<img class="node {}" src="{}" alt="" style="{}">"#,
            class,
            attr(src),
            style_css(style)
        );
    } else {
        // Keep the slot so the surrounding layout does not shift.
        let _ = write!(
            out,
            r#"<div class="node {} missing" style="{}"></div>"#,
            class,
            style_css(style)
        );
    }
}

fn render_financing(out: &mut String, options: &[FinancingOption]) {
    if options.is_empty() {
        return;
    }
    out.push_str(r#"<div class="financing">"#);
    let labels: Vec<String> = options.iter().map(|o| text_of(&o.label())).collect();
    out.push_str(&labels.join(" &middot; "));
    out.push_str("</div>");
}

fn style_css(style: &NodeStyle) -> String {
    let mut css = String::new();
    if style.x.is_some() || style.y.is_some() {
        let _ = write!(
            css,
            "position:absolute;left:{}px;top:{}px;",
            style.x.unwrap_or(0.0),
            style.y.unwrap_or(0.0)
        );
    } else {
        css.push_str("position:relative;");
    }
    if let Some(w) = style.width {
        let _ = write!(css, "width:{}px;", w);
    }
    if let Some(h) = style.height {
        let _ = write!(css, "height:{}px;", h);
    }
    if let Some(size) = style.font_size {
        let _ = write!(css, "font-size:{}px;", size);
    }
    if style.bold {
        css.push_str("font-weight:bold;");
    }
    if let Some(align) = &style.align {
        let _ = write!(css, "text-align:{};", attr(align));
    }
    if let Some(color) = &style.color {
        let _ = write!(css, "color:{};", attr(color));
    }
    css
}

fn text_of(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}
