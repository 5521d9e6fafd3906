//! Bulk ingestion: document sources and the batch driver feeding a session

mod source;

pub use source::{DocumentSource, JsonLinesSource};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::index::IndexSession;

/// Outcome of one ingestion batch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records pulled from the source
    pub read: u64,
    pub indexed: u64,
    /// Records dropped for an empty title or body
    pub skipped: u64,
    pub flushes: u64,
}

/// Feed every record of `source` to `session`, then end the batch.
///
/// Stops early once `max_documents` documents were indexed. A record with an
/// empty title is skipped here rather than forwarded, since an empty title is
/// the session's end-of-batch signal.
pub fn ingest<S>(
    session: &mut IndexSession,
    source: S,
    max_documents: Option<usize>,
) -> Result<IngestReport>
where
    S: DocumentSource,
{
    let before = session.stats();
    let mut report = IngestReport::default();

    for record in source {
        if max_documents.is_some_and(|max| report.indexed >= max as u64) {
            break;
        }
        let doc = record?;
        report.read += 1;

        if !doc.is_indexable() {
            report.skipped += 1;
            continue;
        }
        if session.add_document(&doc.title, &doc.body)?.is_some() {
            report.indexed += 1;
        }
    }
    session.end_batch()?;

    report.flushes = session.stats().flushes - before.flushes;
    info!(
        read = report.read,
        indexed = report.indexed,
        skipped = report.skipped,
        flushes = report.flushes,
        "Ingestion finished"
    );
    Ok(report)
}
