//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator moves through the batch. Callers can forward
//! them to a terminal progress bar, a channel or a log without the library
//! knowing how the host communicates.
//!
//! # Example
//!
//! ```rust
//! use pdf2table::{ExtractionProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     records: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, record_count: usize) {
//!         self.records.fetch_add(record_count, Ordering::SeqCst);
//!         eprintln!("Document {}/{} → {} records", index + 1, total, record_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { records: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each document.
///
/// All methods have default no-op implementations. When `concurrency > 1`
/// the per-document methods may be called concurrently from different
/// tasks, so shared state must be synchronised.
///
/// Document indices are 0-based upload positions.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first document starts.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document enters the pipeline.
    fn on_document_start(&self, index: usize, total_documents: usize) {
        let _ = (index, total_documents);
    }

    /// Called after a document's pages are rasterised and OCR'd.
    fn on_document_text(&self, index: usize, page_count: usize, text_len: usize) {
        let _ = (index, page_count, text_len);
    }

    /// Called when a document produced its records.
    fn on_document_complete(&self, index: usize, total_documents: usize, record_count: usize) {
        let _ = (index, total_documents, record_count);
    }

    /// Called when a document failed in any stage.
    fn on_document_error(&self, index: usize, total_documents: usize, error: String) {
        let _ = (index, total_documents, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
