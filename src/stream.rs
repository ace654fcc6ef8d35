//! Streaming extraction API: emit each document's outcome as it completes.
//!
//! Unlike [`crate::extract::Extractor::run`], which returns only after the
//! whole batch is merged, [`extract_stream`] yields a [`DocumentOutcome`]
//! per document as soon as its pipeline finishes. With `concurrency > 1`
//! outcomes arrive in completion order; sort by
//! [`DocumentOutcome::document_index`] or feed them through
//! [`collect_table`] to recover upload order.

use crate::extract::{DocumentOutcome, Extractor};
use crate::pipeline::aggregate::ResultTable;
use crate::pipeline::input::Document;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document outcomes.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// Run the pipeline over `documents`, streaming outcomes as they are ready.
pub fn extract_stream(
    extractor: Arc<Extractor>,
    documents: Vec<Document>,
    schema: impl Into<String>,
) -> DocumentStream {
    let schema: Arc<str> = Arc::from(schema.into());
    let total = documents.len();
    let concurrency = extractor.config().concurrency;
    info!("Starting streaming extraction: {} documents", total);

    let s = stream::iter(documents.into_iter().map(move |doc| {
        let extractor = Arc::clone(&extractor);
        let schema = Arc::clone(&schema);
        async move { extractor.process_document(&doc, &schema, total).await }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}

/// Drain a [`DocumentStream`] into a table ordered by document index.
///
/// Returns the table and the outcomes (records moved out, reports kept).
pub async fn collect_table(stream: DocumentStream) -> (ResultTable, Vec<DocumentOutcome>) {
    let mut outcomes: Vec<DocumentOutcome> = stream.collect().await;
    outcomes.sort_by_key(DocumentOutcome::document_index);

    let mut table = ResultTable::new();
    for outcome in &mut outcomes {
        if let Ok(records) = &mut outcome.result {
            table.append(outcome.report.document_index, std::mem::take(records));
        }
    }
    (table, outcomes)
}
