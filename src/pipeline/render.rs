//! PDF rasterisation: render every page to a JPEG [`PageImage`] via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so
//! rendering a 40-page scan at 300 DPI does not stall the Tokio workers.
//!
//! ## All pages or nothing
//!
//! OCR assumes contiguous coverage of the document, so the first page that
//! fails to render or encode aborts the whole document with
//! [`DocumentError::PageRender`]. A partial page set is never returned.

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, Pdf2TableError};
use crate::pipeline::{encode, input};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encoding of [`PageImage::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageImageFormat {
    Jpeg,
}

/// One rasterised page.
#[derive(Clone)]
pub struct PageImage {
    /// 0-based page index, equal to the page's position in the PDF.
    /// Errors and log lines report `index + 1`.
    pub index: usize,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    pub format: PageImageFormat,
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImage")
            .field("index", &self.index)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Turns PDF bytes into an ordered sequence of page images.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render every page at `scale` × 72 DPI.
    ///
    /// Returns pages sorted by index, one per PDF page, or an error if the
    /// bytes are not a PDF or any page fails.
    async fn rasterize(&self, pdf: &[u8], scale: f32) -> Result<Vec<PageImage>, DocumentError>;
}

/// [`Rasterizer`] backed by the pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
    max_pixels: u32,
    jpeg_quality: u8,
    password: Option<String>,
}

impl PdfiumRasterizer {
    /// Create a rasteriser and verify that pdfium can be loaded.
    ///
    /// Library lookup order: `config.pdfium_library_path`, then
    /// `PDFIUM_LIB_PATH`, then the system library search path.
    pub fn new(config: &ExtractionConfig) -> Result<Self, Pdf2TableError> {
        let library_path = config.pdfium_library_path.clone().or_else(|| {
            std::env::var("PDFIUM_LIB_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });

        bind_pdfium(library_path.as_deref())
            .map_err(|e| Pdf2TableError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Self {
            library_path,
            max_pixels: config.max_rendered_pixels,
            jpeg_quality: config.jpeg_quality,
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf: &[u8], scale: f32) -> Result<Vec<PageImage>, DocumentError> {
        input::validate_pdf_bytes(pdf)?;

        let bytes = pdf.to_vec();
        let this = self.clone();

        tokio::task::spawn_blocking(move || this.rasterize_blocking(&bytes, scale))
            .await
            .map_err(|e| DocumentError::PageRender {
                page: 0,
                detail: format!("render task panicked: {}", e),
            })?
    }
}

impl PdfiumRasterizer {
    /// Blocking implementation of page rendering.
    fn rasterize_blocking(&self, bytes: &[u8], scale: f32) -> Result<Vec<PageImage>, DocumentError> {
        // Page 0 marks engine-level failures that happen before any page.
        let pdfium = bind_pdfium(self.library_path.as_deref()).map_err(|e| {
            DocumentError::PageRender {
                page: 0,
                detail: format!("pdfium unavailable: {:?}", e),
            }
        })?;

        let password = self.password.as_deref();
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                let detail = if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        "wrong password".to_string()
                    } else {
                        "encrypted PDF requires a password".to_string()
                    }
                } else {
                    err_str
                };
                DocumentError::DocumentFormat { detail }
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        if total_pages == 0 {
            return Err(DocumentError::DocumentFormat {
                detail: "PDF has no pages".to_string(),
            });
        }
        info!("PDF loaded: {} pages, scale {:.2}", total_pages, scale);

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let mut results = Vec::with_capacity(total_pages);

        for idx in 0..total_pages {
            let page = pages
                .get(idx as u16)
                .map_err(|e| DocumentError::PageRender {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| DocumentError::PageRender {
                        page: idx + 1,
                        detail: format!("{:?}", e),
                    })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );

            let data = encode::encode_page(&image, self.jpeg_quality).map_err(|e| {
                DocumentError::PageRender {
                    page: idx + 1,
                    detail: format!("image encoding failed: {}", e),
                }
            })?;

            results.push(PageImage {
                index: idx,
                data,
                format: PageImageFormat::Jpeg,
            });
        }

        Ok(results)
    }
}

/// Bind to pdfium from an explicit file, a directory containing the
/// platform library, or the system search path.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, PdfiumError> {
    let bindings = match library_path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))?
        }
        Some(p) => Pdfium::bind_to_library(p)?,
        None => Pdfium::bind_to_system_library()?,
    };
    Ok(Pdfium::new(bindings))
}
