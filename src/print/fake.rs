//! In-memory print surface that records every call.

use async_trait::async_trait;

use super::{ImageLoadSummary, PrintSurface};
use crate::error::CartelError;

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Open,
    Inject { images: usize },
    WaitReady,
    WaitImages,
    Print,
    Close,
    PrintCurrentScreen,
}

/// How injected images behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageBehavior {
    #[default]
    Load,
    Fail,
    /// Never settle.
    Never,
}

/// Print surface for tests.
#[derive(Debug, Default)]
pub struct FakeSurface {
    calls: Vec<SurfaceCall>,
    html: Option<String>,
    image_count: usize,
    images: ImageBehavior,
    blocked: bool,
    no_screen_fallback: bool,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(mut self, behavior: ImageBehavior) -> Self {
        self.images = behavior;
        self
    }

    /// Refuse to open, like a blocked popup.
    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    pub fn without_screen_fallback(mut self) -> Self {
        self.no_screen_fallback = true;
        self
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.clone()
    }

    /// The last injected markup.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn opened(&self) -> bool {
        self.calls.contains(&SurfaceCall::Open)
    }

    pub fn printed(&self) -> bool {
        self.calls
            .iter()
            .any(|c| matches!(c, SurfaceCall::Print | SurfaceCall::PrintCurrentScreen))
    }
}

#[async_trait]
impl PrintSurface for FakeSurface {
    async fn open(&mut self) -> Result<(), CartelError> {
        self.calls.push(SurfaceCall::Open);
        if self.blocked {
            return Err(CartelError::PrintSurfaceUnavailable("popup blocked".into()));
        }
        Ok(())
    }

    async fn inject(&mut self, html: &str, images: &[String]) -> Result<(), CartelError> {
        self.calls.push(SurfaceCall::Inject {
            images: images.len(),
        });
        self.html = Some(html.to_string());
        self.image_count = images.len();
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), CartelError> {
        self.calls.push(SurfaceCall::WaitReady);
        Ok(())
    }

    async fn wait_images(&mut self) -> ImageLoadSummary {
        self.calls.push(SurfaceCall::WaitImages);
        match self.images {
            ImageBehavior::Load => ImageLoadSummary {
                loaded: self.image_count,
                failed: 0,
            },
            ImageBehavior::Fail => ImageLoadSummary {
                loaded: 0,
                failed: self.image_count,
            },
            ImageBehavior::Never => std::future::pending().await,
        }
    }

    async fn print(&mut self) -> Result<(), CartelError> {
        self.calls.push(SurfaceCall::Print);
        Ok(())
    }

    async fn close(&mut self) {
        self.calls.push(SurfaceCall::Close);
    }

    async fn print_current_screen(&mut self) -> Result<(), CartelError> {
        self.calls.push(SurfaceCall::PrintCurrentScreen);
        if self.no_screen_fallback {
            return Err(CartelError::PrintSurfaceUnavailable("no screen".into()));
        }
        Ok(())
    }
}
