//! CLI binary for pdf2table.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig`, runs the batch and writes the table.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2table::{
    extract_files, prompts::DEFAULT_SCHEMA, ExtractionConfig, ExtractionOutput,
    ExtractionProgressCallback, OcrFailurePolicy, ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders one bar over the batch plus a log line per finished document.
/// Documents may finish out of order when `--concurrency > 1`.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(format!("document {}", index + 1));
    }

    fn on_document_text(&self, index: usize, page_count: usize, text_len: usize) {
        self.bar.set_message(format!(
            "document {}: {page_count} pages, {text_len} chars OCR'd",
            index + 1
        ));
    }

    fn on_document_complete(&self, index: usize, total: usize, record_count: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{record_count:>3} records")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: String) {
        let secs = self.elapsed_secs(index);
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error
        };
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} documents extracted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract the built-in purchase-agreement schema, CSV to stdout
  pdf2table psa-1.pdf psa-2.pdf

  # Write the table to a file (format chosen by extension)
  pdf2table scans/*.pdf -o agreements.csv
  pdf2table scans/*.pdf -o agreements.json

  # Custom schema description
  pdf2table --schema lease-fields.txt lease.pdf

  # Full JSON output with per-document reports and failures
  pdf2table --json psa.pdf > result.json

  # Several documents at once, retry flaky model calls
  pdf2table --concurrency 4 --max-retries 2 scans/*.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID (default: gpt-4-0613)
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise the system library)
  RUST_LOG                Tracing filter, e.g. pdf2table=debug

REQUIREMENTS:
  libpdfium for rendering and the `tesseract` binary for OCR.
"#;

/// Extract structured records from scanned PDF agreements.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2table",
    version,
    about = "Extract structured records from scanned PDF agreements",
    long_about = "Render each page of scanned PDFs, OCR the pages, ask a language model to \
fill a field schema from the recognised text, and merge every document's records into \
one table. A failing document is reported and skipped; the rest of the batch still runs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs, in table order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Text file with the field schema description. Default: built-in
    /// purchase-agreement schema.
    #[arg(short, long, env = "PDF2TABLE_SCHEMA")]
    schema: Option<PathBuf>,

    /// Write the table to this file (.csv or .json) instead of stdout.
    #[arg(short, long, env = "PDF2TABLE_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the full JSON output (table, reports, failures, stats).
    #[arg(long, env = "PDF2TABLE_JSON")]
    json: bool,

    /// LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2TABLE_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Number of documents processed at once.
    #[arg(short, long, env = "PDF2TABLE_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Retries per document on model-service failure.
    #[arg(long, env = "PDF2TABLE_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Per-document deadline in seconds.
    #[arg(long, env = "PDF2TABLE_TIMEOUT")]
    timeout: Option<u64>,

    /// What to do when OCR fails on a page.
    #[arg(long, env = "PDF2TABLE_OCR_POLICY", value_enum, default_value = "degrade")]
    ocr_policy: OcrPolicyArg,

    /// Tesseract language code(s), e.g. eng or eng+spa.
    #[arg(long, env = "PDF2TABLE_LANG", default_value = "eng")]
    lang: String,

    /// Path to the tesseract binary.
    #[arg(long, env = "PDF2TABLE_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2TABLE_PASSWORD")]
    password: Option<String>,

    /// Text file with a custom role preamble for the model.
    #[arg(long, env = "PDF2TABLE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max model output tokens per document.
    #[arg(long, env = "PDF2TABLE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2TABLE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TABLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TABLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2TABLE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OcrPolicyArg {
    Degrade,
    Fail,
}

impl From<OcrPolicyArg> for OcrFailurePolicy {
    fn from(v: OcrPolicyArg) -> Self {
        match v {
            OcrPolicyArg::Degrade => OcrFailurePolicy::Degrade,
            OcrPolicyArg::Fail => OcrFailurePolicy::FailDocument,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports per-document outcomes, so library
    // INFO logs are muted while it is active.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let schema = match cli.schema {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read schema from {:?}", path))?,
        None => DEFAULT_SCHEMA.to_string(),
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract_files(&cli.inputs, &schema, &config)
        .await
        .context("Extraction failed")?;

    match cli.output {
        Some(ref path) => write_output(&output, path, cli.json)?,
        None => {
            let rendered = if cli.json {
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            } else {
                output.table.to_csv().context("Failed to render CSV")?
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    // ── Failure report ───────────────────────────────────────────────────
    if !output.failures.is_empty() {
        eprintln!("{}", bold("Failed documents:"));
        for failure in &output.failures {
            let name = output
                .documents
                .iter()
                .find(|d| d.document_index == failure.document_index)
                .map(|d| d.name.as_str())
                .unwrap_or("?");
            eprintln!("  {} {}  {}", red("✗"), failure, dim(name));
        }
    }

    if !cli.quiet {
        eprintln!(
            "   {} records  /  {} pages  /  {} tokens in  /  {} tokens out  —  {}ms total",
            output.stats.total_records,
            output.stats.total_pages,
            dim(&output.stats.total_prompt_tokens.to_string()),
            dim(&output.stats.total_completion_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    if output.stats.total_documents > 0 && output.stats.succeeded_documents == 0 {
        anyhow::bail!("All {} documents failed", output.stats.total_documents);
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .max_tokens(cli.max_tokens)
        .ocr_failure_policy(cli.ocr_policy.into())
        .ocr_language(cli.lang.clone())
        .tesseract_path(cli.tesseract.clone())
        .download_timeout_secs(cli.download_timeout);

    if let Some(secs) = cli.timeout {
        builder = builder.document_timeout_secs(secs);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write the table (or the full output with `--json`) to `path`.
fn write_output(output: &ExtractionOutput, path: &Path, json: bool) -> Result<()> {
    let as_json = json
        || path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if as_json {
        let rendered =
            serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        output
            .table
            .write_csv(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
