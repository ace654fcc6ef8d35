//! Batch extraction: the pipeline orchestrator and its entry points.
//!
//! [`Extractor`] owns the three engines (rasteriser, OCR, model service)
//! and the configuration. For each document it runs
//! render → OCR → model → parse, catches whatever fails, attributes it to
//! the document index and moves on. Results are merged into the
//! [`ResultTable`] by a single writer once every document has finished,
//! sorted by index, so the table order is the upload order even when
//! `concurrency > 1` lets documents complete out of order.

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, DocumentFailure, Pdf2TableError};
use crate::output::{DocumentReport, ExtractionOutput};
use crate::pipeline::aggregate::{self, ResultTable, StructuredRecord};
use crate::pipeline::input::{self, Document};
use crate::pipeline::llm::{self, LlmModelService, ModelService};
use crate::pipeline::ocr::{self, OcrEngine, TesseractOcr};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What one document produced: its report and either records or an error.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub report: DocumentReport,
    pub result: Result<Vec<StructuredRecord>, DocumentError>,
}

impl DocumentOutcome {
    pub fn document_index(&self) -> usize {
        self.report.document_index
    }
}

/// The pipeline orchestrator.
pub struct Extractor {
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
    model: Arc<dyn ModelService>,
    config: ExtractionConfig,
}

impl Extractor {
    /// Assemble an extractor from explicit engines.
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        ocr: Arc<dyn OcrEngine>,
        model: Arc<dyn ModelService>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            rasterizer,
            ocr,
            model,
            config,
        }
    }

    /// Build the production engines from the configuration: pdfium,
    /// tesseract and the resolved LLM provider.
    ///
    /// Fails before any document is touched if tesseract cannot be run or
    /// pdfium cannot be bound.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, Pdf2TableError> {
        let ocr = TesseractOcr::from_config(config);
        if !ocr.is_available() {
            return Err(Pdf2TableError::OcrEngineUnavailable(format!(
                "'{}' could not be executed",
                config.tesseract_path.display()
            )));
        }
        let rasterizer = PdfiumRasterizer::new(config)?;
        let (provider, model_id) = resolve_provider(config)?;
        let model = LlmModelService::new(provider, model_id, config.max_tokens);

        Ok(Self::new(
            Arc::new(rasterizer),
            Arc::new(ocr),
            Arc::new(model),
            config.clone(),
        ))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run the pipeline over an ordered batch and merge the results.
    ///
    /// Never fails as a whole: per-document errors end up in
    /// [`ExtractionOutput::failures`].
    pub async fn run(&self, documents: Vec<Document>, schema: &str) -> ExtractionOutput {
        self.run_batch(documents, Vec::new(), schema).await
    }

    /// Run `documents` as part of a batch that also contains inputs which
    /// already failed before the pipeline (`preloaded_failures`). Batch
    /// totals and callbacks count both.
    async fn run_batch(
        &self,
        documents: Vec<Document>,
        preloaded_failures: Vec<DocumentReport>,
        schema: &str,
    ) -> ExtractionOutput {
        let start = Instant::now();
        let total = documents.len() + preloaded_failures.len();
        info!(
            "Starting extraction: {} documents, concurrency {}",
            total, self.config.concurrency
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
            for report in &preloaded_failures {
                if let Some(ref failure) = report.error {
                    cb.on_document_error(report.document_index, total, failure.message.clone());
                }
            }
        }

        let mut outcomes: Vec<DocumentOutcome> = stream::iter(documents.iter())
            .map(|doc| self.process_document(doc, schema, total))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        // Single-writer merge in upload order.
        outcomes.sort_by_key(DocumentOutcome::document_index);

        let mut table = ResultTable::new();
        let mut reports = preloaded_failures;
        reports.reserve(outcomes.len());
        for outcome in outcomes {
            if let Ok(records) = outcome.result {
                table.append(outcome.report.document_index, records);
            }
            reports.push(outcome.report);
        }

        let output =
            ExtractionOutput::from_parts(table, reports, start.elapsed().as_millis() as u64);

        info!(
            "Extraction complete: {}/{} documents, {} records, {}ms",
            output.stats.succeeded_documents,
            total,
            output.stats.total_records,
            output.stats.total_duration_ms
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, output.stats.succeeded_documents);
        }

        output
    }

    /// Run one document through every stage, honouring the deadline.
    ///
    /// Always returns an outcome; errors are captured, not propagated.
    pub async fn process_document(
        &self,
        doc: &Document,
        schema: &str,
        total_documents: usize,
    ) -> DocumentOutcome {
        let start = Instant::now();
        let mut report = DocumentReport::new(doc.index, doc.name.clone());

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_document_start(doc.index, total_documents);
        }

        let result = match self.config.document_timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(
                    Duration::from_secs(secs),
                    self.run_stages(doc, schema, &mut report),
                )
                .await
                {
                    Ok(r) => r,
                    Err(_) => Err(DocumentError::Timeout { secs }),
                }
            }
            None => self.run_stages(doc, schema, &mut report).await,
        };

        report.total_duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(records) => {
                report.record_count = records.len();
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_document_complete(doc.index, total_documents, records.len());
                }
            }
            Err(e) => {
                warn!("Document {} ({}) failed: {}", doc.index, doc.name, e);
                report.error = Some(DocumentFailure::new(doc.index, e));
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_document_error(doc.index, total_documents, e.to_string());
                }
            }
        }

        DocumentOutcome { report, result }
    }

    async fn run_stages(
        &self,
        doc: &Document,
        schema: &str,
        report: &mut DocumentReport,
    ) -> Result<Vec<StructuredRecord>, DocumentError> {
        // ── Stage 1: Rasterise ───────────────────────────────────────────
        let render_start = Instant::now();
        let pages = self
            .rasterizer
            .rasterize(&doc.bytes, self.config.scale)
            .await?;
        report.page_count = pages.len();
        report.render_duration_ms = render_start.elapsed().as_millis() as u64;
        debug!(
            "Document {}: rendered {} pages in {}ms",
            doc.index, report.page_count, report.render_duration_ms
        );

        // ── Stage 2: OCR ─────────────────────────────────────────────────
        let ocr_start = Instant::now();
        let text =
            ocr::extract_text(pages, Arc::clone(&self.ocr), self.config.ocr_failure_policy).await?;
        report.ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        report.text_len = text.text.len();
        report.degraded_pages = text.degraded_pages.clone();

        if text.text.trim().is_empty() {
            warn!(
                "Document {}: OCR produced no text across {} pages",
                doc.index, text.page_count
            );
        }
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_document_text(doc.index, text.page_count, text.text.len());
        }

        // ── Stage 3: Schema-guided extraction ────────────────────────────
        let raw = llm::extract_structured(
            self.model.as_ref(),
            doc.index,
            &text.text,
            schema,
            &self.config,
        )
        .await?;
        report.prompt_tokens = raw.prompt_tokens;
        report.completion_tokens = raw.completion_tokens;
        report.model_retries = raw.retries;
        report.llm_duration_ms = raw.duration_ms;

        // ── Stage 4: Parse into records ──────────────────────────────────
        aggregate::parse_records(&raw.content)
    }
}

/// Extract records from in-memory PDFs with the production engines.
///
/// Documents are numbered by their position in `documents`.
pub async fn extract(
    documents: Vec<Vec<u8>>,
    schema: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2TableError> {
    if documents.is_empty() {
        return Err(Pdf2TableError::NoDocuments);
    }
    let extractor = Extractor::from_config(config)?;
    Ok(extractor.run(Document::from_batch(documents), schema).await)
}

/// Extract records from local files and/or HTTP(S) URLs.
///
/// An input that cannot be read or downloaded is reported as an `input`
/// failure at its index; the remaining inputs still run.
pub async fn extract_files(
    inputs: &[impl AsRef<str>],
    schema: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2TableError> {
    if inputs.is_empty() {
        return Err(Pdf2TableError::NoDocuments);
    }
    let extractor = Extractor::from_config(config)?;
    Ok(run_inputs(&extractor, inputs, schema).await)
}

/// Load `inputs` and run them through `extractor`, keeping load failures.
///
/// An input that cannot be loaded counts towards the batch total and is
/// reported through `on_document_error` like any other failed document.
pub async fn run_inputs(
    extractor: &Extractor,
    inputs: &[impl AsRef<str>],
    schema: &str,
) -> ExtractionOutput {
    let timeout = extractor.config().download_timeout_secs;

    let mut documents = Vec::with_capacity(inputs.len());
    let mut load_failures = Vec::new();
    for (index, item) in inputs.iter().enumerate() {
        let item = item.as_ref();
        match input::load_document(index, item, timeout).await {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                warn!("Document {} ({}) could not be loaded: {}", index, item, e);
                let mut report = DocumentReport::new(index, item);
                report.error = Some(DocumentFailure::new(index, &e));
                load_failures.push(report);
            }
        }
    }

    extractor.run_batch(documents, load_failures, schema).await
}

/// Synchronous wrapper around [`extract_files`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    inputs: &[impl AsRef<str>],
    schema: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2TableError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TableError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_files(inputs, schema, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2TableError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2TableError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider and the model label, most specific first:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model_id()`.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<(Arc<dyn LLMProvider>, String), Pdf2TableError> {
    if let Some(ref provider) = config.provider {
        let label = config.model.clone().unwrap_or_else(|| "custom".to_string());
        return Ok((Arc::clone(provider), label));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model_id();
        return Ok((create_provider(name, &model)?, model));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            let model = config.model.clone().unwrap_or(model);
            return Ok((create_provider(&prov, &model)?, model));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model_id();
            return Ok((create_provider("openai", &model)?, model));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2TableError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    let label = config.model.clone().unwrap_or_else(|| "auto".to_string());
    Ok((llm_provider, label))
}
