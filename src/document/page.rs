//! # Page Formats
//!
//! Physical paper sizes a print document is laid out on.
//!
//! | Format | Size (mm) | Size at 96 dpi (px) |
//! |--------|-----------|---------------------|
//! | A4 | 210 × 297 | 794 × 1123 |
//! | A4 landscape | 297 × 210 | 1123 × 794 |
//! | A5 | 148 × 210 | 559 × 794 |
//! | A3 | 297 × 420 | 1123 × 1587 |
//! | Letter | 215.9 × 279.4 | 816 × 1056 |
//!
//! ## Usage
//!
//! ```
//! use carteles::document::PageFormat;
//!
//! let page = PageFormat::A4.size();
//! assert_eq!(page.width_px().round(), 794.0);
//! assert!(!page.is_landscape());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CartelError;

/// CSS pixels per inch.
pub const CSS_DPI: f64 = 96.0;

/// A physical page size.
///
/// ## Calculations
///
/// ```text
/// px_per_mm = 96 / 25.4 ≈ 3.78
/// A4 width  = 210mm × 3.78 ≈ 794px
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    pub const A4: Self = Self {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub const A5: Self = Self {
        width_mm: 148.0,
        height_mm: 210.0,
    };

    pub const A3: Self = Self {
        width_mm: 297.0,
        height_mm: 420.0,
    };

    pub const LETTER: Self = Self {
        width_mm: 215.9,
        height_mm: 279.4,
    };

    /// The same sheet, turned sideways.
    pub fn rotated(self) -> Self {
        Self {
            width_mm: self.height_mm,
            height_mm: self.width_mm,
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.width_mm > self.height_mm
    }

    #[inline]
    pub fn px_per_mm() -> f64 {
        CSS_DPI / 25.4
    }

    #[inline]
    pub fn mm_to_px(mm: f64) -> f64 {
        mm * Self::px_per_mm()
    }

    pub fn width_px(&self) -> f64 {
        Self::mm_to_px(self.width_mm)
    }

    pub fn height_px(&self) -> f64 {
        Self::mm_to_px(self.height_mm)
    }
}

/// Page format chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageFormat {
    #[default]
    A4,
    A4Landscape,
    A5,
    A3,
    Letter,
    Custom { width_mm: f64, height_mm: f64 },
}

impl PageFormat {
    pub fn size(&self) -> PageSize {
        match *self {
            PageFormat::A4 => PageSize::A4,
            PageFormat::A4Landscape => PageSize::A4.rotated(),
            PageFormat::A5 => PageSize::A5,
            PageFormat::A3 => PageSize::A3,
            PageFormat::Letter => PageSize::LETTER,
            PageFormat::Custom {
                width_mm,
                height_mm,
            } => PageSize {
                width_mm,
                height_mm,
            },
        }
    }

    /// Value for a CSS `@page { size: ... }` rule.
    pub fn css_size(&self) -> String {
        match self {
            PageFormat::A4 => "A4 portrait".into(),
            PageFormat::A4Landscape => "A4 landscape".into(),
            PageFormat::A5 => "A5 portrait".into(),
            PageFormat::A3 => "A3 portrait".into(),
            PageFormat::Letter => "letter portrait".into(),
            PageFormat::Custom {
                width_mm,
                height_mm,
            } => format!("{}mm {}mm", width_mm, height_mm),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageFormat::A4 => f.write_str("a4"),
            PageFormat::A4Landscape => f.write_str("a4-landscape"),
            PageFormat::A5 => f.write_str("a5"),
            PageFormat::A3 => f.write_str("a3"),
            PageFormat::Letter => f.write_str("letter"),
            PageFormat::Custom {
                width_mm,
                height_mm,
            } => write!(f, "{}x{}", width_mm, height_mm),
        }
    }
}

impl FromStr for PageFormat {
    type Err = CartelError;

    /// Accepts `a4`, `a4-landscape`, `a5`, `a3`, `letter`, or `WIDTHxHEIGHT` in mm.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let format = match lower.as_str() {
            "a4" => PageFormat::A4,
            "a4-landscape" | "a4_landscape" | "a4l" => PageFormat::A4Landscape,
            "a5" => PageFormat::A5,
            "a3" => PageFormat::A3,
            "letter" | "carta" => PageFormat::Letter,
            other => {
                let parsed = other
                    .split_once('x')
                    .and_then(|(w, h)| Some((w.trim().parse::<f64>().ok()?, h.trim().parse::<f64>().ok()?)))
                    .filter(|(w, h)| *w > 0.0 && *h > 0.0);
                match parsed {
                    Some((width_mm, height_mm)) => PageFormat::Custom {
                        width_mm,
                        height_mm,
                    },
                    None => {
                        return Err(CartelError::Config(format!("Unknown page format '{}'", s)));
                    }
                }
            }
        };
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_pixels() {
        let a4 = PageFormat::A4.size();
        assert!((a4.width_px() - 793.7).abs() < 0.1);
        assert!((a4.height_px() - 1122.5).abs() < 0.1);
    }

    #[test]
    fn test_landscape_is_rotated() {
        let landscape = PageFormat::A4Landscape.size();
        assert!(landscape.is_landscape());
        assert_eq!(landscape.width_mm, 297.0);
        assert!(!PageFormat::Letter.size().is_landscape());
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("A4".parse::<PageFormat>().unwrap(), PageFormat::A4);
        assert_eq!("a4-landscape".parse::<PageFormat>().unwrap(), PageFormat::A4Landscape);
        assert_eq!(
            "100x150".parse::<PageFormat>().unwrap(),
            PageFormat::Custom {
                width_mm: 100.0,
                height_mm: 150.0
            }
        );
        assert!("tabloid".parse::<PageFormat>().is_err());
        assert!("0x150".parse::<PageFormat>().is_err());
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&PageFormat::A4Landscape).unwrap();
        assert_eq!(json, r#"{"type":"a4_landscape"}"#);
        let custom: PageFormat =
            serde_json::from_str(r#"{"type":"custom","width_mm":100,"height_mm":70}"#).unwrap();
        assert!(custom.size().is_landscape());
    }
}
