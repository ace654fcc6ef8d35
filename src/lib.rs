//! # pdf2table
//!
//! Turn scanned PDF agreements into a structured table using OCR and a
//! language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes (one per uploaded document)
//!  │
//!  ├─ 1. Render     rasterise every page via pdfium at 300 DPI (spawn_blocking)
//!  ├─ 2. OCR        tesseract per page, texts joined in page order
//!  ├─ 3. Extract    document text + schema → model at temperature 0
//!  ├─ 4. Aggregate  parse JSON, flatten arrays, append records
//!  └─ 5. Output     ResultTable (union of columns) + per-document failures
//! ```
//!
//! A document that fails in any stage is recorded in
//! [`ExtractionOutput::failures`] with its index and error kind; the rest
//! of the batch still produces rows.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2table::{extract_files, prompts::DEFAULT_SCHEMA, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let output = extract_files(&["psa-1.pdf", "psa-2.pdf"], DEFAULT_SCHEMA, &config).await?;
//!     print!("{}", output.table.to_csv()?);
//!     for failure in &output.failures {
//!         eprintln!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2table` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, OcrFailurePolicy};
pub use error::{DocumentError, DocumentFailure, ErrorKind, Pdf2TableError};
pub use extract::{extract, extract_files, extract_sync, run_inputs, DocumentOutcome, Extractor};
pub use output::{DocumentReport, ExtractionOutput, ExtractionStats};
pub use pipeline::aggregate::{Cell, ModelOutput, ResultTable, StructuredRecord, TableRow};
pub use pipeline::input::Document;
pub use pipeline::llm::{ModelCompletion, ModelService, ModelServiceError};
pub use pipeline::ocr::{DocumentText, OcrEngine, OcrError};
pub use pipeline::render::{PageImage, PageImageFormat, Rasterizer};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{collect_table, extract_stream, DocumentStream};
