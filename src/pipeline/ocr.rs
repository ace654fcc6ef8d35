//! Text extraction: OCR every page image and join the texts in page order.
//!
//! The engine sits behind the [`OcrEngine`] trait. The production engine,
//! [`TesseractOcr`], drives the `tesseract` executable; tests substitute
//! a stub. OCR is CPU-bound and blocking, so the page loop runs inside
//! `spawn_blocking`.

use crate::config::{ExtractionConfig, OcrFailurePolicy};
use crate::error::DocumentError;
use crate::pipeline::encode;
use crate::pipeline::render::PageImage;
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Recognises text in a single raster image.
pub trait OcrEngine: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Return the recognised text. Blank images yield an empty string, not
    /// an error.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// One document's OCR output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    /// Page texts joined by `"\n"` in increasing page order.
    pub text: String,
    pub page_count: usize,
    /// 0-based indices of pages whose OCR failed and contributed "".
    pub degraded_pages: Vec<usize>,
}

/// OCR all pages and join them in page order.
///
/// Every page contributes exactly one segment (possibly empty), so a
/// document with `k` pages always yields `k` segments.
pub async fn extract_text(
    pages: Vec<PageImage>,
    engine: Arc<dyn OcrEngine>,
    policy: OcrFailurePolicy,
) -> Result<DocumentText, DocumentError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(pages, engine.as_ref(), policy))
        .await
        .map_err(|e| DocumentError::Ocr {
            page: 0,
            detail: format!("OCR task panicked: {}", e),
        })?
}

fn extract_text_blocking(
    mut pages: Vec<PageImage>,
    engine: &dyn OcrEngine,
    policy: OcrFailurePolicy,
) -> Result<DocumentText, DocumentError> {
    pages.sort_by_key(|p| p.index);

    let mut segments = Vec::with_capacity(pages.len());
    let mut degraded_pages = Vec::new();

    for page in &pages {
        let start = Instant::now();
        let result = encode::decode_page(&page.data)
            .map_err(OcrError::from)
            .and_then(|img| engine.recognize(&img));

        match result {
            Ok(text) => {
                debug!(
                    "Page {}: {} chars via {} in {:?}",
                    page.index + 1,
                    text.len(),
                    engine.name(),
                    start.elapsed()
                );
                segments.push(text);
            }
            // A missing engine is not a page glitch; degrading would send
            // an empty document to the model.
            Err(OcrError::EngineNotAvailable(detail)) => {
                return Err(DocumentError::Ocr {
                    page: page.index + 1,
                    detail: format!("OCR engine not available: {}", detail),
                });
            }
            Err(e) => match policy {
                OcrFailurePolicy::Degrade => {
                    warn!("Page {}: OCR failed, using empty text — {}", page.index + 1, e);
                    degraded_pages.push(page.index);
                    segments.push(String::new());
                }
                OcrFailurePolicy::FailDocument => {
                    return Err(DocumentError::Ocr {
                        page: page.index + 1,
                        detail: e.to_string(),
                    });
                }
            },
        }
    }

    Ok(DocumentText {
        text: segments.join("\n"),
        page_count: pages.len(),
        degraded_pages,
    })
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// [`OcrEngine`] that shells out to the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.tesseract_path.clone(), config.ocr_language.clone())
    }

    /// Check whether the binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        // PNG avoids a second lossy pass over the page.
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("page.png");
        image.save_with_format(&image_path, image::ImageFormat::Png)?;

        let output = Command::new(&self.binary)
            .arg(&image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::EngineNotAvailable(
                format!("{} not found (install tesseract-ocr)", self.binary.display()),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}
