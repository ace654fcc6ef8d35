//! Output types returned by the extraction entry points.

use crate::error::{DocumentFailure, Pdf2TableError};
use crate::pipeline::aggregate::ResultTable;
use serde::Serialize;

/// Result of a batch run: the table plus an accounting of every document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    /// Records from every successful document, in upload order.
    pub table: ResultTable,
    /// One entry per failed document, sorted by document index.
    pub failures: Vec<DocumentFailure>,
    /// One report per input document, sorted by document index.
    pub documents: Vec<DocumentReport>,
    pub stats: ExtractionStats,
}

/// Per-document pipeline accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentReport {
    /// 0-based upload index.
    pub document_index: usize,
    pub name: String,
    pub page_count: usize,
    /// 0-based indices (as in `PageImage::index`) of pages whose OCR
    /// failed and contributed empty text. Error messages number pages
    /// from 1.
    pub degraded_pages: Vec<usize>,
    pub text_len: usize,
    pub record_count: usize,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub model_retries: u32,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Set when the document failed.
    pub error: Option<DocumentFailure>,
}

impl DocumentReport {
    pub fn new(document_index: usize, name: impl Into<String>) -> Self {
        Self {
            document_index,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Batch-level totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub total_documents: usize,
    pub succeeded_documents: usize,
    pub failed_documents: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_duration_ms: u64,
}

impl ExtractionOutput {
    /// Assemble the output from the merged table and the per-document
    /// reports. Failures and stats are derived from the reports.
    pub fn from_parts(
        table: ResultTable,
        mut documents: Vec<DocumentReport>,
        total_duration_ms: u64,
    ) -> Self {
        documents.sort_by_key(|d| d.document_index);

        let failures: Vec<DocumentFailure> =
            documents.iter().filter_map(|d| d.error.clone()).collect();

        let stats = ExtractionStats {
            total_documents: documents.len(),
            succeeded_documents: documents.len() - failures.len(),
            failed_documents: failures.len(),
            total_records: table.len(),
            total_pages: documents.iter().map(|d| d.page_count).sum(),
            total_prompt_tokens: documents.iter().map(|d| d.prompt_tokens as u64).sum(),
            total_completion_tokens: documents.iter().map(|d| d.completion_tokens as u64).sum(),
            total_duration_ms,
        };

        Self {
            table,
            failures,
            documents,
            stats,
        }
    }

    /// True when no document failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Treat any document failure as an error.
    pub fn into_result(self) -> Result<Self, Pdf2TableError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Pdf2TableError::PartialFailure {
                success: self.stats.succeeded_documents,
                failed: self.stats.failed_documents,
                total: self.stats.total_documents,
            })
        }
    }
}
