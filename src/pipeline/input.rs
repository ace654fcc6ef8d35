//! Input resolution: turn a user-supplied path or URL into an in-memory
//! [`Document`].
//!
//! The whole PDF is held in memory; pdfium loads it from the byte slice, so
//! no temp file is written for URL inputs. The `%PDF` header is validated
//! up-front so callers get a `DocumentFormat` error rather than a pdfium
//! crash on HTML error pages or truncated downloads.

use crate::error::DocumentError;
use std::path::Path;
use tracing::{debug, info};

/// The PDF header must start within the first 1024 bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// One uploaded PDF, identified by its position in the batch.
#[derive(Clone)]
pub struct Document {
    /// 0-based upload index.
    pub index: usize,
    /// Display name (file name or URL).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(index: usize, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            index,
            name: name.into(),
            bytes,
        }
    }

    /// Wrap an ordered list of byte buffers, numbering them in order.
    pub fn from_batch(batch: Vec<Vec<u8>>) -> Vec<Document> {
        batch
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| Document::new(i, format!("document-{}", i + 1), bytes))
            .collect()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Verify the buffer carries a `%PDF-` header.
pub fn validate_pdf_bytes(bytes: &[u8]) -> Result<(), DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::DocumentFormat {
            detail: "empty file".to_string(),
        });
    }
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        return Ok(());
    }
    let magic: Vec<u8> = bytes.iter().take(4).copied().collect();
    Err(DocumentError::DocumentFormat {
        detail: format!("missing %PDF header, first bytes: {:?}", magic),
    })
}

/// Load one input (local path or HTTP/HTTPS URL) into a [`Document`].
pub async fn load_document(
    index: usize,
    input: &str,
    timeout_secs: u64,
) -> Result<Document, DocumentError> {
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    Ok(Document::new(index, input, bytes))
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, DocumentError> {
    let path = Path::new(path_str);
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        let detail = match e.kind() {
            std::io::ErrorKind::NotFound => "file not found".to_string(),
            std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => e.to_string(),
        };
        DocumentError::Input {
            source_name: path_str.to_string(),
            detail,
        }
    })?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, DocumentError> {
    info!("Downloading PDF from: {}", url);

    let input_err = |detail: String| DocumentError::Input {
        source_name: url.to_string(),
        detail,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| input_err(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            input_err(format!("download timed out after {timeout_secs}s"))
        } else {
            input_err(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(input_err(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| input_err(e.to_string()))?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
