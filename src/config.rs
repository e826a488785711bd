//! # Engine Configuration
//!
//! All tunables of the binding and print pipeline, loadable from TOML.
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [audit]
//! min_justification_chars = 15
//!
//! [layout]
//! header_asset = "https://cdn.example.com/header.png"
//! ```
//!
//! | Section | Field | Default |
//! |---------|-------|---------|
//! | `resolver` | `tax_excluded_factor` | 0.83 |
//! | `resolver` | `default_discount_percent` | 20 |
//! | `resolver` | `validity_days` | 7 |
//! | `audit` | `min_justification_chars` | 10 |
//! | `audit` | `report_timeout_ms` | 10000 |
//! | `layout` | `page_fill` | 0.92 |
//! | `layout` | `min_scale` / `max_scale` | 0.25 / 1.0 |
//! | `assets` | `asset_timeout_ms` | 6000 |
//! | `assets` | `document_timeout_ms` | 15000 |
//! | `print` | `image_wait_timeout_ms` | 15000 |
//! | `print` | `teardown_grace_ms` | 500 |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CartelError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    pub audit: AuditConfig,
    pub layout: LayoutConfig,
    pub assets: AssetConfig,
    pub print: PrintConfig,
}

/// Derived-default parameters of the value resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Multiplier from the shelf price to the tax-excluded price.
    pub tax_excluded_factor: f64,
    /// Discount shown when nobody typed one.
    pub default_discount_percent: f64,
    /// Length of the default validity window, starting today.
    pub validity_days: u32,
    /// Origin shown when nobody typed one.
    pub default_origin: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tax_excluded_factor: 0.83,
            default_discount_percent: 20.0,
            validity_days: 7,
            default_origin: "Nacional".into(),
        }
    }
}

/// Audit gate parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub min_justification_chars: usize,
    pub report_timeout_ms: u64,
    /// Endpoint receiving change reports. Reports are only logged when unset.
    pub report_webhook: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            min_justification_chars: 10,
            report_timeout_ms: 10_000,
            report_webhook: None,
        }
    }
}

impl AuditConfig {
    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.report_timeout_ms)
    }
}

/// Page layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Fraction of the page a scaled canvas may occupy on each axis.
    pub page_fill: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Extra scale for a portrait canvas on a landscape page.
    pub landscape_boost: f64,
    /// Header artwork (URL or local path). No header when unset.
    pub header_asset: Option<String>,
    pub header_height_mm: f64,
    pub header_fallback_text: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_fill: 0.92,
            min_scale: 0.25,
            max_scale: 1.0,
            landscape_boost: 1.15,
            header_asset: None,
            header_height_mm: 28.0,
            header_fallback_text: "OFERTAS".into(),
        }
    }
}

/// Asset preloading bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub asset_timeout_ms: u64,
    pub document_timeout_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_timeout_ms: 6_000,
            document_timeout_ms: 15_000,
        }
    }
}

impl AssetConfig {
    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.document_timeout_ms)
    }
}

/// Print executor parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    pub image_wait_timeout_ms: u64,
    pub teardown_grace_ms: u64,
    /// Where the file surface writes print jobs.
    pub output_dir: PathBuf,
    /// External command receiving the written HTML path (e.g. `lp`).
    pub print_command: Option<String>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            image_wait_timeout_ms: 15_000,
            teardown_grace_ms: 500,
            output_dir: PathBuf::from("print-jobs"),
            print_command: None,
        }
    }
}

impl PrintConfig {
    pub fn image_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.image_wait_timeout_ms)
    }

    pub fn teardown_grace(&self) -> Duration {
        Duration::from_millis(self.teardown_grace_ms)
    }
}

impl EngineConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, CartelError> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| CartelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, CartelError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CartelError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values that would break layout or the audit gate.
    pub fn validate(&self) -> Result<(), CartelError> {
        let layout = &self.layout;
        if !(layout.page_fill > 0.0 && layout.page_fill <= 1.0) {
            return Err(CartelError::Config(format!(
                "layout.page_fill must be in (0, 1], got {}",
                layout.page_fill
            )));
        }
        let scale_ok = layout.min_scale > 0.0
            && layout.min_scale <= layout.max_scale
            && layout.max_scale.is_finite();
        if !scale_ok {
            return Err(CartelError::Config(format!(
                "layout scale range [{}, {}] is empty",
                layout.min_scale, layout.max_scale
            )));
        }
        if layout.landscape_boost.is_nan() || layout.landscape_boost < 1.0 {
            return Err(CartelError::Config(
                "layout.landscape_boost must be at least 1.0".into(),
            ));
        }
        if self.audit.min_justification_chars == 0 {
            return Err(CartelError::Config(
                "audit.min_justification_chars must be positive".into(),
            ));
        }
        let factor = self.resolver.tax_excluded_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CartelError::Config(format!(
                "resolver.tax_excluded_factor must be in (0, 1], got {}",
                factor
            )));
        }
        if !(0.0..100.0).contains(&self.resolver.default_discount_percent) {
            return Err(CartelError::Config(
                "resolver.default_discount_percent must be in [0, 100)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.audit.min_justification_chars, 10);
        assert_eq!(config.layout.page_fill, 0.92);
        assert_eq!(config.resolver.tax_excluded_factor, 0.83);
        assert!(config.layout.header_asset.is_none());
    }

    #[test]
    fn test_partial_section_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            [audit]
            min_justification_chars = 25

            [layout]
            header_asset = "assets/header.png"
            "#,
        )
        .unwrap();
        assert_eq!(config.audit.min_justification_chars, 25);
        assert_eq!(config.audit.report_timeout_ms, 10_000);
        assert_eq!(config.layout.header_asset.as_deref(), Some("assets/header.png"));
        assert_eq!(config.layout.max_scale, 1.0);
    }

    #[test]
    fn test_inverted_scale_range_rejected() {
        let err = EngineConfig::from_toml_str("[layout]\nmin_scale = 2.0\n").unwrap_err();
        assert!(matches!(err, CartelError::Config(_)));
    }

    #[test]
    fn test_nan_and_full_discount_rejected() {
        let mut config = EngineConfig::default();
        config.layout.max_scale = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.resolver.default_discount_percent = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(EngineConfig::from_toml_str("[audit\n").is_err());
    }
}
