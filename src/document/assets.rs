//! # Asset Availability
//!
//! Decorative images (header artwork, template art, product photos) are
//! probed before layout. A probe that fails or does not answer in time marks
//! the asset unavailable; the document then substitutes a fallback. Missing
//! assets never fail a document.
//!
//! Two bounds apply: one per asset, and one for the whole document. Assets
//! still unchecked when the document budget runs out count as unavailable.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::AssetConfig;
use crate::error::CartelError;

/// Checks whether an image can be loaded.
#[async_trait]
pub trait AssetProbe: Send + Sync {
    async fn probe(&self, src: &str) -> Result<(), CartelError>;
}

/// Probes URLs over HTTP and everything else on the local filesystem.
///
/// An asset is available when its bytes decode as an image.
#[derive(Debug, Clone)]
pub struct HttpAssetProbe {
    client: reqwest::Client,
}

impl HttpAssetProbe {
    pub fn new() -> Result<Self, CartelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("carteles/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CartelError::Config(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CartelError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CartelError::AssetUnavailable(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CartelError::AssetUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CartelError::AssetUnavailable(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AssetProbe for HttpAssetProbe {
    async fn probe(&self, src: &str) -> Result<(), CartelError> {
        if src.starts_with("data:") {
            return Ok(());
        }

        let bytes = if src.starts_with("http://") || src.starts_with("https://") {
            self.fetch(src).await?
        } else {
            let path = src.strip_prefix("file://").unwrap_or(src);
            tokio::fs::read(Path::new(path))
                .await
                .map_err(|e| CartelError::AssetUnavailable(format!("{}: {}", src, e)))?
        };

        image::load_from_memory(&bytes)
            .map(|_| ())
            .map_err(|e| CartelError::AssetUnavailable(format!("{}: {}", src, e)))
    }
}

/// Probe with canned answers.
///
/// Sources are available by default; individual sources can be marked
/// missing or stalled (the probe never answers for them).
#[derive(Debug, Clone, Default)]
pub struct StaticAssetProbe {
    missing: BTreeSet<String>,
    stalled: BTreeSet<String>,
    stall_everything: bool,
}

impl StaticAssetProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A probe that never answers for any source.
    pub fn never_resolving() -> Self {
        Self {
            stall_everything: true,
            ..Self::default()
        }
    }

    pub fn missing(mut self, src: impl Into<String>) -> Self {
        self.missing.insert(src.into());
        self
    }

    pub fn stalled(mut self, src: impl Into<String>) -> Self {
        self.stalled.insert(src.into());
        self
    }
}

#[async_trait]
impl AssetProbe for StaticAssetProbe {
    async fn probe(&self, src: &str) -> Result<(), CartelError> {
        if self.stall_everything || self.stalled.contains(src) {
            std::future::pending::<()>().await;
        }
        if self.missing.contains(src) {
            return Err(CartelError::AssetUnavailable(src.to_string()));
        }
        Ok(())
    }
}

/// Availability of every probed source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetReport {
    status: BTreeMap<String, bool>,
}

impl AssetReport {
    pub fn is_available(&self, src: &str) -> bool {
        self.status.get(src).copied().unwrap_or(false)
    }

    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.status
            .iter()
            .filter(|(_, ok)| **ok)
            .map(|(src, _)| src.as_str())
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &str> {
        self.status
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(src, _)| src.as_str())
    }

    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }
}

/// Probe one source within `timeout`.
pub async fn check_asset(probe: &dyn AssetProbe, src: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, probe.probe(src)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(src, error = %e, "asset unavailable");
            false
        }
        Err(_) => {
            debug!(src, timeout_ms = timeout.as_millis() as u64, "asset probe timed out");
            false
        }
    }
}

/// Probe every source once, under the per-asset and document bounds.
pub async fn preload<'a>(
    probe: &dyn AssetProbe,
    sources: impl IntoIterator<Item = &'a str>,
    config: &AssetConfig,
) -> AssetReport {
    let deadline = Instant::now() + config.document_timeout();
    let mut report = AssetReport::default();

    for src in sources {
        if report.status.contains_key(src) {
            continue;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        let ok = if remaining.is_zero() {
            false
        } else {
            check_asset(probe, src, config.asset_timeout().min(remaining)).await
        };
        report.status.insert(src.to_string(), ok);
    }

    let missing = report.unavailable().count();
    if missing > 0 {
        warn!(missing, total = report.len(), "some assets unavailable, using fallbacks");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AssetConfig {
        AssetConfig {
            asset_timeout_ms: 6_000,
            document_timeout_ms: 15_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_asset_times_out() {
        let probe = StaticAssetProbe::new().stalled("slow.png");
        let report = preload(&probe, ["header.png", "slow.png"], &config()).await;
        assert!(report.is_available("header.png"));
        assert!(!report.is_available("slow.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_document_budget_bounds_total_wait() {
        let probe = StaticAssetProbe::never_resolving();
        let started = Instant::now();
        let report = preload(&probe, ["a.png", "b.png", "c.png", "d.png"], &config()).await;
        assert_eq!(report.unavailable().count(), 4);
        assert!(started.elapsed() <= Duration::from_millis(15_000));
    }

    #[tokio::test]
    async fn test_missing_asset_and_duplicates() {
        let probe = StaticAssetProbe::new().missing("gone.png");
        let report = preload(&probe, ["gone.png", "ok.png", "ok.png"], &config()).await;
        assert_eq!(report.len(), 2);
        assert_eq!(report.available().collect::<Vec<_>>(), vec!["ok.png"]);
    }

    #[tokio::test]
    async fn test_local_file_probe() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("dot.png");
        image::RgbImage::new(2, 2).save(&png).unwrap();
        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"not an image").unwrap();

        let probe = HttpAssetProbe::new().unwrap();
        assert!(probe.probe(png.to_str().unwrap()).await.is_ok());
        assert!(probe.probe(junk.to_str().unwrap()).await.is_err());
        assert!(probe.probe("/nonexistent/header.png").await.is_err());
    }
}
