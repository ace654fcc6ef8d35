//! Configuration types for PDF-to-table extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Engine handles (the LLM provider,
//! the pdfium library location, the tesseract binary) are plain fields here
//! rather than process globals, so tests can swap any of them out.

use crate::error::Pdf2TableError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Baseline resolution of PDF user space (1 pt = 1/72 inch).
pub const PDF_BASE_DPI: u32 = 72;

/// Default rendering resolution; print quality keeps OCR accurate on scans.
pub const DEFAULT_DPI: u32 = 300;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4-0613";

/// Configuration for a batch extraction.
///
/// # Example
/// ```rust
/// use pdf2table::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(200)
///     .concurrency(4)
///     .model("gpt-4.1")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering scale relative to 72 DPI. Default: 300/72 ≈ 4.17.
    pub scale: f32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 5000.
    ///
    /// A letter page at 300 DPI is 2550 × 3300 px; the cap only bites on
    /// oversized pages such as plats and survey drawings.
    pub max_rendered_pixels: u32,

    /// JPEG quality (1–100) used when encoding page images. Default: 90.
    pub jpeg_quality: u8,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to libpdfium. Falls back to `PDFIUM_LIB_PATH`, then the
    /// system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Tesseract language code(s), e.g. "eng" or "eng+spa". Default: "eng".
    pub ocr_language: String,

    /// Tesseract executable. Default: "tesseract" (resolved via `PATH`).
    pub tesseract_path: PathBuf,

    /// What to do when OCR fails on one page. Default: [`OcrFailurePolicy::Degrade`].
    pub ocr_failure_policy: OcrFailurePolicy,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or `EDGEQUAKE_MODEL`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Maximum tokens the model may generate per document. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts around the model call only. Default: 0.
    ///
    /// Rendering and OCR are deterministic in their inputs and are never
    /// retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Replacement for the built-in role preamble of the extraction prompt.
    pub system_prompt: Option<String>,

    /// Number of documents processed at once. Default: 1 (sequential).
    pub concurrency: usize,

    /// Per-document deadline in seconds. None disables the deadline.
    pub document_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for document lifecycle events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_DPI as f32 / PDF_BASE_DPI as f32,
            max_rendered_pixels: 5000,
            jpeg_quality: 90,
            password: None,
            pdfium_library_path: None,
            ocr_language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            ocr_failure_policy: OcrFailurePolicy::default(),
            model: None,
            provider_name: None,
            provider: None,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            system_prompt: None,
            concurrency: 1,
            document_timeout_secs: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("scale", &self.scale)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_failure_policy", &self.ocr_failure_policy)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("document_timeout_secs", &self.document_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Effective rendering resolution in dots per inch.
    pub fn dpi(&self) -> f32 {
        self.scale * PDF_BASE_DPI as f32
    }

    /// Model id: config, then `EDGEQUAKE_MODEL`, then [`DEFAULT_MODEL`].
    pub fn model_id(&self) -> String {
        if let Some(ref m) = self.model {
            return m.clone();
        }
        match std::env::var("EDGEQUAKE_MODEL") {
            Ok(m) if !m.is_empty() => m,
            _ => DEFAULT_MODEL.to_string(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Set the rendering resolution; stored as a scale over 72 DPI.
    pub fn dpi(mut self, dpi: u32) -> Self {
        let dpi = dpi.clamp(72, 600);
        self.config.scale = dpi as f32 / PDF_BASE_DPI as f32;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn ocr_failure_policy(mut self, policy: OcrFailurePolicy) -> Self {
        self.config.ocr_failure_policy = policy;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn document_timeout_secs(mut self, secs: u64) -> Self {
        self.config.document_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2TableError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale < 1.0 || c.scale > 600.0 / PDF_BASE_DPI as f32 {
            return Err(Pdf2TableError::InvalidConfig(format!(
                "Scale must be 1.0–{:.2} (72–600 DPI), got {}",
                600.0 / PDF_BASE_DPI as f32,
                c.scale
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2TableError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(Pdf2TableError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.document_timeout_secs == Some(0) {
            return Err(Pdf2TableError::InvalidConfig(
                "Document timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Behaviour when the OCR engine errors on a single page.
///
/// `Degrade` keeps the document alive: the page contributes an empty text
/// segment and a warning is logged. Partial text usually still carries the
/// price, parties and dates. `FailDocument` is for callers that would rather
/// drop the document than extract from incomplete text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrFailurePolicy {
    /// Substitute an empty string for the failed page. (default)
    #[default]
    Degrade,
    /// Fail the whole document on the first page error.
    FailDocument,
}
