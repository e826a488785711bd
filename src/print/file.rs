//! Print surface that writes each job as a standalone HTML file.
//!
//! When a print command is configured (e.g. `lp`), it is run with the job
//! path as its only argument. Otherwise the written file is the output.
//!
//! The on-screen fallback saves the last injected markup as
//! `cartel-<id>-screen.html` for manual printing; it never runs the command.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ImageLoadSummary, PrintSurface};
use crate::config::PrintConfig;
use crate::error::CartelError;

#[derive(Debug)]
pub struct HtmlFileSurface {
    output_dir: PathBuf,
    print_command: Option<String>,
    job: Option<PathBuf>,
    images: Vec<String>,
    /// Markup last injected, kept across `close` for the fallback.
    screen: Option<String>,
}

impl HtmlFileSurface {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            print_command: None,
            job: None,
            images: Vec::new(),
            screen: None,
        }
    }

    pub fn from_config(config: &PrintConfig) -> Self {
        let mut surface = Self::new(&config.output_dir);
        surface.print_command = config.print_command.clone();
        surface
    }

    pub fn print_command(mut self, command: impl Into<String>) -> Self {
        self.print_command = Some(command.into());
        self
    }

    /// Path of the current (or last) job file.
    pub fn job_path(&self) -> Option<&Path> {
        self.job.as_deref()
    }
}

fn unavailable(what: &str, e: impl std::fmt::Display) -> CartelError {
    CartelError::PrintSurfaceUnavailable(format!("{}: {}", what, e))
}

#[async_trait]
impl PrintSurface for HtmlFileSurface {
    async fn open(&mut self) -> Result<(), CartelError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| unavailable(&self.output_dir.display().to_string(), e))?;
        self.job = Some(
            self.output_dir
                .join(format!("cartel-{}.html", Uuid::new_v4().simple())),
        );
        Ok(())
    }

    async fn inject(&mut self, html: &str, images: &[String]) -> Result<(), CartelError> {
        let job = self
            .job
            .as_ref()
            .ok_or_else(|| CartelError::PrintSurfaceUnavailable("surface not open".into()))?;
        tokio::fs::write(job, html)
            .await
            .map_err(|e| unavailable(&job.display().to_string(), e))?;
        self.images = images.to_vec();
        self.screen = Some(html.to_string());
        debug!(path = %job.display(), bytes = html.len(), "print job written");
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), CartelError> {
        let job = self
            .job
            .as_ref()
            .ok_or_else(|| CartelError::PrintSurfaceUnavailable("surface not open".into()))?;
        tokio::fs::metadata(job)
            .await
            .map(|_| ())
            .map_err(|e| unavailable(&job.display().to_string(), e))
    }

    /// Local images must exist; remote ones are left to the renderer.
    async fn wait_images(&mut self) -> ImageLoadSummary {
        let mut summary = ImageLoadSummary::default();
        for src in &self.images {
            let local = !(src.starts_with("http://")
                || src.starts_with("https://")
                || src.starts_with("data:"));
            let path = src.strip_prefix("file://").unwrap_or(src);
            if !local || tokio::fs::metadata(path).await.is_ok() {
                summary.loaded += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    async fn print(&mut self) -> Result<(), CartelError> {
        let job = self
            .job
            .as_ref()
            .ok_or_else(|| CartelError::PrintSurfaceUnavailable("surface not open".into()))?;
        let Some(command) = &self.print_command else {
            info!(path = %job.display(), "print job ready");
            return Ok(());
        };

        let status = Command::new(command)
            .arg(job)
            .status()
            .await
            .map_err(|e| unavailable(command, e))?;
        if !status.success() {
            return Err(CartelError::PrintSurfaceUnavailable(format!(
                "{} exited with {}",
                command, status
            )));
        }
        info!(path = %job.display(), command = %command, "print job sent");
        Ok(())
    }

    async fn close(&mut self) {
        self.images.clear();
    }

    async fn print_current_screen(&mut self) -> Result<(), CartelError> {
        let html = self
            .screen
            .as_deref()
            .ok_or_else(|| CartelError::PrintSurfaceUnavailable("nothing on screen".into()))?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| unavailable(&self.output_dir.display().to_string(), e))?;
        let path = self
            .output_dir
            .join(format!("cartel-{}-screen.html", Uuid::new_v4().simple()));
        tokio::fs::write(&path, html)
            .await
            .map_err(|e| unavailable(&path.display().to_string(), e))?;
        warn!(path = %path.display(), "print command unavailable, saved screen for manual printing");
        self.job = Some(path);
        Ok(())
    }
}
