//! Integration tests for the extraction pipeline.
//!
//! The orchestrator runs against stub engines so the batch semantics
//! (isolation, ordering, merging, retries, deadlines) are checked without
//! pdfium, tesseract or an API key:
//!
//! - `StubRasterizer` reads a tiny text "PDF" (`%PDF-stub id=3 pages=2`)
//!   and draws one JPEG per page. Image width encodes the document id and
//!   the grey level encodes the page index.
//! - `ShapeOcr` reads both back and returns `doc-<id> page-<n>`.
//! - `ScriptedModel` answers each prompt with a closure keyed on the
//!   document id found in the prompt.
//!
//! The live test at the bottom is gated behind `E2E_ENABLED`.

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use pdf2table::pipeline::encode;
use pdf2table::pipeline::input::validate_pdf_bytes;
use pdf2table::pipeline::ocr::TesseractOcr;
use pdf2table::{
    collect_table, extract_stream, run_inputs, Cell, Document, DocumentError, ErrorKind,
    ExtractionConfig, ExtractionProgressCallback, Extractor, ModelCompletion, ModelService,
    ModelServiceError, OcrEngine, OcrError, OcrFailurePolicy, PageImage, PageImageFormat,
    Pdf2TableError, Rasterizer,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Stub engines ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct StubRasterizer {
    calls: AtomicUsize,
}

/// Read `key=value` from a stub document header.
fn stub_field(text: &str, key: &str) -> Option<u64> {
    text.split_whitespace()
        .find_map(|tok| tok.strip_prefix(key)?.strip_prefix('=')?.parse().ok())
}

#[async_trait]
impl Rasterizer for StubRasterizer {
    async fn rasterize(&self, pdf: &[u8], _scale: f32) -> Result<Vec<PageImage>, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        validate_pdf_bytes(pdf)?;

        let text = String::from_utf8_lossy(pdf);
        let id = stub_field(&text, "id").ok_or_else(|| DocumentError::DocumentFormat {
            detail: "no id".into(),
        })?;
        let pages = stub_field(&text, "pages").unwrap_or(1);
        if let Some(ms) = stub_field(&text, "delay") {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        let broken_page = stub_field(&text, "broken");

        let mut out = Vec::new();
        for index in 0..pages as usize {
            if broken_page == Some(index as u64) {
                return Err(DocumentError::PageRender {
                    page: index + 1,
                    detail: "bitmap allocation failed".into(),
                });
            }
            let shade = (index * 40) as u8;
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
                8 + id as u32,
                8,
                Rgb([shade, shade, shade]),
            ));
            out.push(PageImage {
                index,
                data: encode::encode_page(&img, 95).expect("encode page"),
                format: PageImageFormat::Jpeg,
            });
        }
        Ok(out)
    }
}

struct ShapeOcr {
    /// Fail on this page index of every document.
    fail_on_page: Option<usize>,
}

impl OcrEngine for ShapeOcr {
    fn name(&self) -> &str {
        "shape"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let rgb = image.to_rgb8();
        let id = rgb.width() - 8;
        let page = ((rgb.get_pixel(0, 0)[0] as f32) / 40.0).round() as usize;
        if Some(page) == self.fail_on_page {
            return Err(OcrError::OcrFailed("engine crashed".into()));
        }
        Ok(format!("doc-{id} page-{page}"))
    }
}

type Script = dyn Fn(usize, usize) -> Result<String, String> + Send + Sync;

/// Answers with `script(document_id, call_number)`; records every prompt.
struct ScriptedModel {
    script: Box<Script>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(script: impl Fn(usize, usize) -> Result<String, String> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

/// The first `doc-<n>` in a prompt.
fn doc_id(prompt: &str) -> usize {
    let start = prompt.find("doc-").expect("prompt carries OCR text") + 4;
    prompt[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .expect("doc id")
}

#[async_trait]
impl ModelService for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<ModelCompletion, ModelServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.script)(doc_id(prompt), call)
            .map(|content| ModelCompletion {
                content,
                prompt_tokens: prompt.len() / 4,
                completion_tokens: 10,
            })
            .map_err(ModelServiceError)
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

const SCHEMA: &str = r#"{"address": "address of the property", "purchase_price": "price as $X"}"#;

fn stub_pdf(header: &str) -> Vec<u8> {
    format!("%PDF-stub {header}\n").into_bytes()
}

fn docs(items: Vec<Vec<u8>>) -> Vec<Document> {
    Document::from_batch(items)
}

fn address_record(id: usize, _call: usize) -> Result<String, String> {
    Ok(format!(
        r#"{{"address": "{id} Main St", "purchase_price": "${id}00,000"}}"#
    ))
}

fn extractor_with(
    rasterizer: Arc<StubRasterizer>,
    ocr: ShapeOcr,
    model: Arc<ScriptedModel>,
    config: ExtractionConfig,
) -> Extractor {
    Extractor::new(rasterizer, Arc::new(ocr), model, config)
}

fn extractor(model: Arc<ScriptedModel>, config: ExtractionConfig) -> Extractor {
    extractor_with(
        Arc::new(StubRasterizer::default()),
        ShapeOcr { fail_on_page: None },
        model,
        config,
    )
}

fn row_documents(table: &pdf2table::ResultTable) -> Vec<usize> {
    table.rows().iter().map(|r| r.document_index).collect()
}

// ── Batch semantics ──────────────────────────────────────────────────────────

#[tokio::test]
async fn corrupt_document_is_isolated() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let ex = extractor(Arc::clone(&model), ExtractionConfig::default());

    let batch = docs(vec![
        stub_pdf("id=0 pages=2"),
        b"this is not a pdf".to_vec(),
        stub_pdf("id=2 pages=1"),
    ]);
    let output = ex.run(batch, SCHEMA).await;

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].document_index, 1);
    assert_eq!(output.failures[0].kind, ErrorKind::DocumentFormat);
    assert_eq!(row_documents(&output.table), vec![0, 2]);
    assert_eq!(output.stats.succeeded_documents, 2);
    // The corrupt document never reached the model.
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn schema_fields_become_columns() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let ex = extractor(Arc::clone(&model), ExtractionConfig::default());

    let output = ex.run(docs(vec![stub_pdf("id=7 pages=2")]), SCHEMA).await;

    assert!(output.is_complete());
    assert_eq!(output.table.columns(), vec!["address", "purchase_price"]);
    let record = &output.table.rows()[0].record;
    assert_eq!(record["address"], "7 Main St");
    assert_eq!(record["purchase_price"], "$700,000");

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(SCHEMA), "schema passed verbatim");
    assert!(
        prompts[0].contains("doc-7 page-0\ndoc-7 page-1"),
        "pages joined in order"
    );

    let report = &output.documents[0];
    assert_eq!(report.page_count, 2);
    assert_eq!(report.record_count, 1);
    assert!(report.prompt_tokens > 0);
}

#[tokio::test]
async fn heterogeneous_records_merge_with_absent_cells() {
    let model = Arc::new(ScriptedModel::new(|id, _| {
        Ok(match id {
            0 => r#"{"address": "A", "price": "$1"}"#.to_string(),
            _ => r#"{"address": "B", "notes": "n"}"#.to_string(),
        })
    }));
    let ex = extractor(model, ExtractionConfig::default());

    let output = ex
        .run(docs(vec![stub_pdf("id=0"), stub_pdf("id=1")]), SCHEMA)
        .await;

    assert_eq!(output.table.columns(), vec!["address", "price", "notes"]);
    let rows = output.table.projected_rows();
    assert!(rows[0][2].is_absent());
    assert!(rows[1][1].is_absent());
    assert_eq!(rows[1][2], Cell::Value(&serde_json::json!("n")));

    let csv = output.table.to_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["_document,address,price,notes", "1,A,$1,", "2,B,,n"]);
}

#[tokio::test]
async fn array_output_appends_one_row_per_element() {
    let model = Arc::new(ScriptedModel::new(|id, _| {
        Ok(match id {
            0 => "```json\n[{\"address\": \"Lot 1\"}, {\"address\": \"Lot 2\"}]\n```".to_string(),
            _ => r#"{"address": "Single"}"#.to_string(),
        })
    }));
    let ex = extractor(model, ExtractionConfig::default());

    let output = ex
        .run(docs(vec![stub_pdf("id=0"), stub_pdf("id=1")]), SCHEMA)
        .await;

    assert_eq!(output.table.len(), 3);
    assert_eq!(row_documents(&output.table), vec![0, 0, 1]);
    assert_eq!(output.documents[0].record_count, 2);
}

#[tokio::test]
async fn malformed_model_output_is_isolated() {
    let model = Arc::new(ScriptedModel::new(|id, _| {
        Ok(match id {
            1 => "Sure! The address is 1 Main St.".to_string(),
            _ => r#"{"address": "ok"}"#.to_string(),
        })
    }));
    let ex = extractor(model, ExtractionConfig::default());

    let output = ex
        .run(
            docs(vec![stub_pdf("id=0"), stub_pdf("id=1"), stub_pdf("id=2")]),
            SCHEMA,
        )
        .await;

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].document_index, 1);
    assert_eq!(output.failures[0].kind, ErrorKind::MalformedModelOutput);
    assert_eq!(row_documents(&output.table), vec![0, 2]);
}

#[tokio::test]
async fn identical_inputs_give_identical_tables() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let ex = extractor(model, ExtractionConfig::default());
    let batch = || docs(vec![stub_pdf("id=1 pages=3"), stub_pdf("id=2 pages=1")]);

    let first = ex.run(batch(), SCHEMA).await;
    let second = ex.run(batch(), SCHEMA).await;

    assert_eq!(first.table, second.table);
    assert_eq!(first.table.to_csv().unwrap(), second.table.to_csv().unwrap());
}

#[tokio::test]
async fn page_render_failure_discards_document() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let ex = extractor(Arc::clone(&model), ExtractionConfig::default());

    let output = ex
        .run(
            docs(vec![stub_pdf("id=0 pages=3 broken=1"), stub_pdf("id=1")]),
            SCHEMA,
        )
        .await;

    assert_eq!(output.failures[0].kind, ErrorKind::PageRender);
    assert!(output.failures[0].message.contains("Page 2"));
    assert_eq!(row_documents(&output.table), vec![1]);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

// ── OCR policy ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ocr_failure_degrades_by_default() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let ex = extractor_with(
        Arc::new(StubRasterizer::default()),
        ShapeOcr {
            fail_on_page: Some(1),
        },
        Arc::clone(&model),
        ExtractionConfig::default(),
    );

    let output = ex.run(docs(vec![stub_pdf("id=4 pages=3")]), SCHEMA).await;

    assert!(output.is_complete());
    assert_eq!(output.documents[0].degraded_pages, vec![1]);
    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains("doc-4 page-0\n\ndoc-4 page-2"));
}

#[tokio::test]
async fn ocr_failure_can_fail_the_document() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let config = ExtractionConfig::builder()
        .ocr_failure_policy(OcrFailurePolicy::FailDocument)
        .build()
        .unwrap();
    let ex = extractor_with(
        Arc::new(StubRasterizer::default()),
        ShapeOcr {
            fail_on_page: Some(1),
        },
        Arc::clone(&model),
        config,
    );

    let output = ex.run(docs(vec![stub_pdf("id=4 pages=3")]), SCHEMA).await;

    assert_eq!(output.failures[0].kind, ErrorKind::Ocr);
    // Page index 1 is reported as the second page.
    assert!(output.failures[0].message.contains("Page 2"));
    assert!(output.table.is_empty());
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_ocr_engine_fails_the_document() {
    let model = Arc::new(ScriptedModel::new(|_, _| {
        Ok(r#"{"address": "invented"}"#.to_string())
    }));
    let ex = Extractor::new(
        Arc::new(StubRasterizer::default()),
        Arc::new(TesseractOcr::new("/nonexistent/tesseract", "eng")),
        Arc::clone(&model) as Arc<dyn ModelService>,
        ExtractionConfig::default(),
    );

    let output = ex.run(docs(vec![stub_pdf("id=0 pages=2")]), SCHEMA).await;

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].kind, ErrorKind::Ocr);
    assert!(output.table.is_empty());
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn from_config_rejects_missing_tesseract() {
    let config = ExtractionConfig::builder()
        .tesseract_path("/nonexistent/tesseract")
        .build()
        .unwrap();

    let result = Extractor::from_config(&config);

    assert!(matches!(
        result,
        Err(Pdf2TableError::OcrEngineUnavailable(_))
    ));
}

// ── Retries and deadlines ────────────────────────────────────────────────────

#[tokio::test]
async fn retry_wraps_only_the_model_call() {
    let rasterizer = Arc::new(StubRasterizer::default());
    let model = Arc::new(ScriptedModel::new(|_, _| Err("rate limited".to_string())));
    let config = ExtractionConfig::builder()
        .max_retries(2)
        .retry_backoff_ms(1)
        .build()
        .unwrap();
    let ex = extractor_with(
        Arc::clone(&rasterizer),
        ShapeOcr { fail_on_page: None },
        Arc::clone(&model),
        config,
    );

    let output = ex.run(docs(vec![stub_pdf("id=0")]), SCHEMA).await;

    assert_eq!(output.failures[0].kind, ErrorKind::ModelService);
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transient_model_error_recovers_with_retry() {
    let model = Arc::new(ScriptedModel::new(|id, call| {
        if call == 0 {
            Err("502 bad gateway".to_string())
        } else {
            address_record(id, call)
        }
    }));
    let config = ExtractionConfig::builder()
        .max_retries(1)
        .retry_backoff_ms(1)
        .build()
        .unwrap();
    let ex = extractor(model, config);

    let output = ex.run(docs(vec![stub_pdf("id=0")]), SCHEMA).await;

    assert!(output.is_complete());
    assert_eq!(output.documents[0].model_retries, 1);
}

#[tokio::test]
async fn no_retry_by_default() {
    let model = Arc::new(ScriptedModel::new(|_, _| Err("boom".to_string())));
    let ex = extractor(Arc::clone(&model), ExtractionConfig::default());

    let output = ex.run(docs(vec![stub_pdf("id=0")]), SCHEMA).await;

    assert_eq!(output.failures[0].kind, ErrorKind::ModelService);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn slow_document_times_out() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let config = ExtractionConfig::builder()
        .document_timeout_secs(1)
        .concurrency(2)
        .build()
        .unwrap();
    let ex = extractor(model, config);

    let output = ex
        .run(
            docs(vec![stub_pdf("id=0 delay=2500"), stub_pdf("id=1")]),
            SCHEMA,
        )
        .await;

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].document_index, 0);
    assert_eq!(output.failures[0].kind, ErrorKind::Timeout);
    assert_eq!(row_documents(&output.table), vec![1]);
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_run_keeps_upload_order() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let config = ExtractionConfig::builder().concurrency(4).build().unwrap();
    let ex = extractor(model, config);

    // Earlier documents finish last.
    let batch = docs(vec![
        stub_pdf("id=0 delay=300"),
        stub_pdf("id=1 delay=200"),
        stub_pdf("id=2 delay=100"),
        stub_pdf("id=3"),
    ]);
    let output = ex.run(batch, SCHEMA).await;

    assert_eq!(row_documents(&output.table), vec![0, 1, 2, 3]);
    let addresses: Vec<&str> = output
        .table
        .rows()
        .iter()
        .map(|r| r.record["address"].as_str().unwrap())
        .collect();
    assert_eq!(addresses, vec!["0 Main St", "1 Main St", "2 Main St", "3 Main St"]);
}

#[tokio::test]
async fn stream_collects_into_ordered_table() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let config = ExtractionConfig::builder().concurrency(3).build().unwrap();
    let ex = Arc::new(extractor(model, config));

    let batch = docs(vec![
        stub_pdf("id=0 delay=150"),
        b"%PDF-stub pages=1".to_vec(),
        stub_pdf("id=2"),
    ]);
    let (table, outcomes) = collect_table(extract_stream(ex, batch, SCHEMA)).await;

    assert_eq!(row_documents(&table), vec![0, 2]);
    let indices: Vec<usize> = outcomes.iter().map(|o| o.document_index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(matches!(
        outcomes[1].result,
        Err(DocumentError::DocumentFormat { .. })
    ));
}

// ── Progress reporting ───────────────────────────────────────────────────────

#[derive(Default)]
struct CountingCallback {
    batch_total: AtomicUsize,
    texts: AtomicUsize,
    completes: AtomicUsize,
    errors: AtomicUsize,
    final_success: AtomicUsize,
}

impl ExtractionProgressCallback for CountingCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.batch_total.store(total_documents, Ordering::SeqCst);
    }

    fn on_document_text(&self, _index: usize, _page_count: usize, _text_len: usize) {
        self.texts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_complete(&self, _index: usize, _total: usize, _record_count: usize) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_error(&self, _index: usize, _total: usize, _error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _total: usize, success_count: usize) {
        self.final_success.store(success_count, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_document() {
    let cb = Arc::new(CountingCallback::default());
    let model = Arc::new(ScriptedModel::new(address_record));
    let config = ExtractionConfig::builder()
        .progress_callback(Arc::clone(&cb) as Arc<dyn ExtractionProgressCallback>)
        .build()
        .unwrap();
    let ex = extractor(model, config);

    ex.run(
        docs(vec![stub_pdf("id=0"), b"junk".to_vec(), stub_pdf("id=2")]),
        SCHEMA,
    )
    .await;

    assert_eq!(cb.batch_total.load(Ordering::SeqCst), 3);
    assert_eq!(cb.texts.load(Ordering::SeqCst), 2);
    assert_eq!(cb.completes.load(Ordering::SeqCst), 2);
    assert_eq!(cb.errors.load(Ordering::SeqCst), 1);
    assert_eq!(cb.final_success.load(Ordering::SeqCst), 2);
}

// ── Inputs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreadable_input_reported_at_its_index() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.pdf");
    std::fs::write(&good, stub_pdf("id=5")).unwrap();
    let missing = dir.path().join("missing.pdf");

    let cb = Arc::new(CountingCallback::default());
    let model = Arc::new(ScriptedModel::new(address_record));
    let config = ExtractionConfig::builder()
        .progress_callback(Arc::clone(&cb) as Arc<dyn ExtractionProgressCallback>)
        .build()
        .unwrap();
    let ex = extractor(model, config);

    let inputs = vec![
        missing.to_string_lossy().into_owned(),
        good.to_string_lossy().into_owned(),
    ];
    let output = run_inputs(&ex, &inputs, SCHEMA).await;

    assert_eq!(output.stats.total_documents, 2);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].document_index, 0);
    assert_eq!(output.failures[0].kind, ErrorKind::Input);
    assert_eq!(row_documents(&output.table), vec![1]);
    assert_eq!(output.documents[1].name, inputs[1]);

    // The unreadable input counts towards the batch seen by callbacks.
    assert_eq!(cb.batch_total.load(Ordering::SeqCst), 2);
    assert_eq!(cb.errors.load(Ordering::SeqCst), 1);
    assert_eq!(cb.completes.load(Ordering::SeqCst), 1);
    assert_eq!(cb.final_success.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn output_serialises_failures_and_table() {
    let model = Arc::new(ScriptedModel::new(address_record));
    let ex = extractor(model, ExtractionConfig::default());

    let output = ex
        .run(docs(vec![stub_pdf("id=0"), Vec::new()]), SCHEMA)
        .await;
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["table"]["columns"][0], "address");
    assert_eq!(json["failures"][0]["document_index"], 1);
    assert_eq!(json["failures"][0]["kind"], "document_format");
    assert_eq!(json["stats"]["total_records"], 1);
}

// ── Live end-to-end ──────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip unless E2E_ENABLED is set and the sample PDF exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("pdf2table=debug"))
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn e2e_purchase_agreement() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("purchase_agreement.pdf"));
    init_tracing();

    let config = ExtractionConfig::default();
    let inputs = vec![path.to_string_lossy().into_owned()];
    let output = pdf2table::extract_files(&inputs, pdf2table::prompts::DEFAULT_SCHEMA, &config)
        .await
        .expect("extraction runs");

    println!("{}", output.table.to_csv().unwrap());
    assert!(output.is_complete(), "failures: {:?}", output.failures);
    assert!(!output.table.is_empty());
    assert!(output.table.columns().iter().any(|c| c == "address"));
}
