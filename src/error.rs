//! Error types for the pdf2table library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2TableError`] — **Fatal**: the batch cannot run at all (invalid
//!   configuration, provider not configured, pdfium or tesseract cannot be
//!   loaded).
//!   Returned as `Err(Pdf2TableError)` from the top-level `extract*`
//!   functions.
//!
//! * [`DocumentError`] — **Per-document**: one PDF failed somewhere in the
//!   pipeline (corrupt file, page render glitch, model API error, model
//!   ignored the JSON format). It is caught at the orchestrator, attributed
//!   to the document index and stored as a [`DocumentFailure`] in
//!   [`crate::output::ExtractionOutput`] so the other documents still land
//!   in the table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2table library.
#[derive(Debug, Error)]
pub enum Pdf2TableError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The batch contained no documents.
    #[error("No input documents were supplied")]
    NoDocuments,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Some documents succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ExtractionOutput::into_result`] when
    /// the caller wants to treat any document failure as an error.
    #[error("{failed}/{total} documents failed during extraction")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output table file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The result table could not be rendered as CSV.
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install libpdfium system-wide.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── OCR engine errors ─────────────────────────────────────────────────
    /// The OCR executable cannot be run.
    #[error(
        "OCR engine not available: {0}\n\n\
You can:\n\
  • Install tesseract-ocr (e.g. `apt install tesseract-ocr`).\n\
  • Point --tesseract / PDF2TABLE_TESSERACT at the binary.\n"
    )]
    OcrEngineUnavailable(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure confined to a single document.
///
/// Every variant is caught by the orchestrator and turned into a
/// [`DocumentFailure`]; none of them aborts the batch.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// The document could not be read or downloaded.
    #[error("Cannot read document '{source_name}': {detail}")]
    Input { source_name: String, detail: String },

    /// The bytes are not a parseable PDF.
    #[error("Not a parseable PDF: {detail}")]
    DocumentFormat { detail: String },

    /// A page could not be rasterised; no partial page set is kept.
    /// `page` is 1-based; 0 means pdfium failed before reaching any page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    PageRender { page: usize, detail: String },

    /// OCR failed on a page under `OcrFailurePolicy::FailDocument`, or the
    /// engine could not be run at all. `page` is 1-based.
    #[error("Page {page}: OCR failed: {detail}")]
    Ocr { page: usize, detail: String },

    /// The language-model service returned an error (transport, auth, rate limit).
    #[error("Model service error after {retries} retries: {detail}")]
    ModelService { retries: u32, detail: String },

    /// The model response was not valid JSON.
    #[error("Model output is not valid JSON: {detail}")]
    MalformedModelOutput { detail: String },

    /// The per-document deadline expired.
    #[error("Document timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl DocumentError {
    /// The coarse error category recorded in [`DocumentFailure`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocumentError::Input { .. } => ErrorKind::Input,
            DocumentError::DocumentFormat { .. } => ErrorKind::DocumentFormat,
            DocumentError::PageRender { .. } => ErrorKind::PageRender,
            DocumentError::Ocr { .. } => ErrorKind::Ocr,
            DocumentError::ModelService { .. } => ErrorKind::ModelService,
            DocumentError::MalformedModelOutput { .. } => ErrorKind::MalformedModelOutput,
            DocumentError::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

/// Error category of a failed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    DocumentFormat,
    PageRender,
    Ocr,
    ModelService,
    MalformedModelOutput,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::DocumentFormat => "document_format",
            ErrorKind::PageRender => "page_render",
            ErrorKind::Ocr => "ocr",
            ErrorKind::ModelService => "model_service",
            ErrorKind::MalformedModelOutput => "malformed_model_output",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the per-document error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    /// 0-based upload index of the failed document.
    pub document_index: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl DocumentFailure {
    pub fn new(document_index: usize, error: &DocumentError) -> Self {
        Self {
            document_index,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "document {} [{}]: {}",
            self.document_index, self.kind, self.message
        )
    }
}
