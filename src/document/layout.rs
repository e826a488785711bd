//! Fitting a template canvas onto a physical page.
//!
//! The canvas is scaled uniformly:
//!
//! ```text
//! scale = min(page_w × fill / canvas_w, page_h × fill / canvas_h)
//! ```
//!
//! A portrait canvas on a landscape page is boosted (it would otherwise
//! leave wide empty margins), without ever exceeding the page. The result is
//! clamped to `[min_scale, max_scale]`.

use super::page::PageSize;
use crate::config::LayoutConfig;
use crate::template::Canvas;

/// Where a scaled canvas sits on a page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Uniform scale factor for `canvas` on an area of `width × height` px.
pub fn fit_scale(canvas: Canvas, width: f64, height: f64, config: &LayoutConfig) -> f64 {
    if canvas.width <= 0.0 || canvas.height <= 0.0 {
        return config.min_scale;
    }

    let fill = config.page_fill;
    let mut scale = (width * fill / canvas.width).min(height * fill / canvas.height);

    if canvas.is_portrait() && width > height {
        let edge_to_edge = (width / canvas.width).min(height / canvas.height);
        scale = (scale * config.landscape_boost).min(edge_to_edge);
    }

    // f64::clamp panics on an inverted or NaN range.
    let lower = config.min_scale.min(config.max_scale);
    let upper = config.max_scale.max(config.min_scale);
    scale.max(lower).min(upper)
}

/// Center a scaled canvas on the page, below a header band of `header_px`.
pub fn place(canvas: Canvas, page: PageSize, header_px: f64, config: &LayoutConfig) -> Placement {
    let area_w = page.width_px();
    let area_h = (page.height_px() - header_px).max(0.0);
    let scale = fit_scale(canvas, area_w, area_h, config);

    let width = canvas.width * scale;
    let height = canvas.height * scale;
    Placement {
        scale,
        left: ((area_w - width) / 2.0).max(0.0),
        top: header_px + ((area_h - height) / 2.0).max(0.0),
        width,
        height,
    }
}
