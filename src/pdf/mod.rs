//! HTML to PDF conversion.
//!
//! - `PdfEngine` - the async seam the budget pipeline renders through
//! - `ChromePdfEngine` - headless Chromium, one process per render
//! - `ThrottledEngine` - bounds how many renders run at once
//! - `EngineSession` - scoped ownership of a running engine process
//! - `EngineLauncher` / `EngineProcess` - how engine processes are started and driven

pub mod chrome;
pub mod process;
pub mod session;
pub mod throttle;

pub use chrome::{ChromeConfig, ChromeLauncher, ChromePdfEngine};
pub use process::{EngineLauncher, EngineProcess};
pub use session::EngineSession;
pub use throttle::ThrottledEngine;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// CSS reference resolution used to convert pixel margins to inches.
pub const CSS_PX_PER_INCH: f64 = 96.0;
pub const A4_WIDTH_IN: f64 = 8.27;
pub const A4_HEIGHT_IN: f64 = 11.69;
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Page setup for a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    /// Applied to all four sides.
    pub margin_in: f64,
    pub print_background: bool,
}

impl PdfOptions {
    /// A4 portrait with 20px margins and backgrounds printed.
    pub fn a4() -> Self {
        Self {
            paper_width_in: A4_WIDTH_IN,
            paper_height_in: A4_HEIGHT_IN,
            margin_in: 20.0 / CSS_PX_PER_INCH,
            print_background: true,
        }
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::a4()
    }
}

/// Why a render failed. The HTTP layer reports all of these as one opaque 500.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch rendering engine: {0}")]
    Launch(#[source] anyhow::Error),
    #[error("rendering engine did not start within {0:?}")]
    LaunchTimeout(Duration),
    #[error("failed to prepare render workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("failed to open rendering surface: {0}")]
    Surface(#[source] anyhow::Error),
    #[error("failed to load document: {0}")]
    Load(#[source] anyhow::Error),
    #[error("failed to capture PDF: {0}")]
    Capture(#[source] anyhow::Error),
    #[error("rendering engine returned {0} bytes that are not a PDF")]
    InvalidOutput(usize),
    #[error("render did not finish within {0:?}")]
    Deadline(Duration),
    #[error("no render slot became free within {0:?}")]
    QueueTimeout(Duration),
    #[error("rendering engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl RenderError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Launch(_) => "launch",
            Self::LaunchTimeout(_) => "launch_timeout",
            Self::Workspace(_) => "workspace",
            Self::Surface(_) => "surface",
            Self::Load(_) => "load",
            Self::Capture(_) => "capture",
            Self::InvalidOutput(_) => "invalid_output",
            Self::Deadline(_) => "deadline",
            Self::QueueTimeout(_) => "queue_timeout",
            Self::EngineUnavailable(_) => "unavailable",
        }
    }
}

/// Converts a complete HTML document into PDF bytes.
///
/// Implementations own every resource they acquire for a call and release it
/// before returning, on success and on error. Output is all-or-nothing.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn render(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError>;
}

#[async_trait]
impl<E: PdfEngine + ?Sized> PdfEngine for Arc<E> {
    async fn render(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        (**self).render(html, options).await
    }
}
