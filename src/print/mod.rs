//! # Print Executor
//!
//! Drives a [`PrintSurface`] through its lifecycle:
//!
//! ```text
//! open ──► inject ──► wait_ready ──► wait for images ──► print ──► (grace) ──► close
//!                                     (bounded; a timeout
//!                                      does not stop printing)
//! ```
//!
//! If any step up to and including `print` fails, the surface is closed and
//! the executor falls back to [`PrintSurface::print_current_screen`]. Only
//! when that also fails does the caller see
//! [`CartelError::PrintSurfaceUnavailable`].
//!
//! ## Surfaces
//!
//! | Surface | Use |
//! |---------|-----|
//! | [`HtmlFileSurface`] | Writes the HTML job to disk, optional print command |
//! | [`FakeSurface`] | Records every call, for tests |

pub mod fake;
pub mod file;

pub use fake::{FakeSurface, ImageBehavior, SurfaceCall};
pub use file::HtmlFileSurface;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::PrintConfig;
use crate::document::PrintDocument;
use crate::error::CartelError;

/// How the images of an injected document settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageLoadSummary {
    pub loaded: usize,
    pub failed: usize,
}

impl ImageLoadSummary {
    pub fn total(&self) -> usize {
        self.loaded + self.failed
    }
}

/// A print-capable rendering target.
#[async_trait]
pub trait PrintSurface: Send {
    async fn open(&mut self) -> Result<(), CartelError>;

    /// Load the document markup and the images it references.
    async fn inject(&mut self, html: &str, images: &[String]) -> Result<(), CartelError>;

    async fn wait_ready(&mut self) -> Result<(), CartelError>;

    /// Resolve once every image has loaded or failed.
    async fn wait_images(&mut self) -> ImageLoadSummary;

    /// Invoke the platform print action.
    async fn print(&mut self) -> Result<(), CartelError>;

    async fn close(&mut self);

    /// Last-resort path: print whatever is on screen.
    async fn print_current_screen(&mut self) -> Result<(), CartelError> {
        Err(CartelError::PrintSurfaceUnavailable(
            "no on-screen print available".into(),
        ))
    }
}

/// Result of waiting for images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageWait {
    Settled(ImageLoadSummary),
    TimedOut,
}

/// Which path ended up printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintMode {
    Document,
    OnScreenFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintOutcome {
    pub mode: PrintMode,
    /// `None` when the document path failed before images were awaited.
    pub images: Option<ImageWait>,
    pub pages: usize,
}

/// Runs a document through a print surface.
#[derive(Debug, Clone, Copy)]
pub struct PrintExecutor {
    image_wait_timeout: Duration,
    teardown_grace: Duration,
}

impl PrintExecutor {
    pub fn new(image_wait_timeout: Duration, teardown_grace: Duration) -> Self {
        Self {
            image_wait_timeout,
            teardown_grace,
        }
    }

    pub fn from_config(config: &PrintConfig) -> Self {
        Self::new(config.image_wait_timeout(), config.teardown_grace())
    }

    /// Print `document`, falling back to on-screen print if the document
    /// path fails.
    pub async fn execute(
        &self,
        surface: &mut dyn PrintSurface,
        document: &PrintDocument,
    ) -> Result<PrintOutcome, CartelError> {
        let pages = document.page_count();
        match self.print_document(surface, document).await {
            Ok(images) => {
                tokio::time::sleep(self.teardown_grace).await;
                surface.close().await;
                info!(pages, ?images, "document printed");
                Ok(PrintOutcome {
                    mode: PrintMode::Document,
                    images: Some(images),
                    pages,
                })
            }
            Err(e) => {
                warn!(error = %e, "document print failed, falling back to on-screen print");
                surface.close().await;
                surface.print_current_screen().await.map_err(|fallback| {
                    CartelError::PrintSurfaceUnavailable(format!("{}; fallback: {}", e, fallback))
                })?;
                Ok(PrintOutcome {
                    mode: PrintMode::OnScreenFallback,
                    images: None,
                    pages,
                })
            }
        }
    }

    async fn print_document(
        &self,
        surface: &mut dyn PrintSurface,
        document: &PrintDocument,
    ) -> Result<ImageWait, CartelError> {
        surface.open().await?;
        surface.inject(&document.to_html(), &document.images).await?;
        surface.wait_ready().await?;

        let images = match tokio::time::timeout(self.image_wait_timeout, surface.wait_images()).await
        {
            Ok(summary) => {
                if summary.total() > 0 && summary.loaded == 0 {
                    warn!(failed = summary.failed, "no image loaded, printing anyway");
                }
                ImageWait::Settled(summary)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.image_wait_timeout.as_millis() as u64,
                    "images still loading, printing anyway"
                );
                ImageWait::TimedOut
            }
        };

        surface.print().await?;
        Ok(images)
    }
}

impl Default for PrintExecutor {
    fn default() -> Self {
        Self::from_config(&PrintConfig::default())
    }
}
