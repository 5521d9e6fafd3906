//! Indexing session: accumulate documents into a buffer and flush it
//!
//! A session owns its buffer exclusively. The buffer is flushed once its
//! distinct token count passes the configured threshold, and always when the
//! caller ends the batch.
//!
//! A flush writes each buffered token with its own store call. Writes are not
//! transactional across tokens: if one fails, tokens written before it stay
//! updated and the tokens not yet written are dropped from the buffer. The
//! caller has to re-run the batch to recover them.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::buffer::IndexBuffer;
use super::codec;
use super::dictionary::TokenDictionary;
use super::merge::{merge_fragment, IndexFragments, TokenFragment};
use crate::config::IndexSettings;
use crate::error::{GramdexError, Result};
use crate::models::{DocumentId, TokenId, QUERY_DOCUMENT_ID};
use crate::persistence::Store;
use crate::tokenizer::NgramTokenizer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Nothing buffered
    Idle,
    Accumulating,
    /// Set while buffered tokens are written; every flush leaves this state
    /// before returning, whether it succeeds or fails
    Flushing,
}

/// Running counters for one session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Documents indexed over the whole session; never reset by a flush
    pub indexed_documents: u64,
    pub buffered_documents: usize,
    pub buffered_tokens: usize,
    pub flushes: u64,
    /// Documents dropped for an empty title or body
    pub skipped_documents: u64,
}

pub struct IndexSession {
    store: Arc<dyn Store>,
    settings: IndexSettings,
    tokenizer: NgramTokenizer,
    dictionary: TokenDictionary,
    buffer: IndexBuffer,
    state: SessionState,
    indexed_documents: u64,
    skipped_documents: u64,
    flushes: u64,
}

impl IndexSession {
    pub fn new(store: Arc<dyn Store>, settings: IndexSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            tokenizer: NgramTokenizer::from_settings(&settings),
            dictionary: TokenDictionary::new(store.clone()),
            store,
            settings,
            buffer: IndexBuffer::new(),
            state: SessionState::Idle,
            indexed_documents: 0,
            skipped_documents: 0,
            flushes: 0,
        })
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            indexed_documents: self.indexed_documents,
            buffered_documents: self.buffer.document_count(),
            buffered_tokens: self.buffer.token_count(),
            flushes: self.flushes,
            skipped_documents: self.skipped_documents,
        }
    }

    /// Buffered fragments, keyed by token id
    pub fn buffer_snapshot(&self) -> &IndexFragments {
        self.buffer.fragments()
    }

    /// Index one document.
    ///
    /// An empty title is the end-of-batch signal and flushes the buffer. An
    /// empty body skips the document. Returns the stored document id when
    /// the document was indexed.
    pub fn add_document(&mut self, title: &str, body: &str) -> Result<Option<DocumentId>> {
        if title.is_empty() {
            self.end_batch()?;
            return Ok(None);
        }
        if body.is_empty() {
            debug!("Skipping document '{}' with empty body", title);
            self.skipped_documents += 1;
            self.maybe_flush()?;
            return Ok(None);
        }

        let document_id = self.store.upsert_document(title, body)?;
        if document_id == QUERY_DOCUMENT_ID {
            return Err(GramdexError::store(format!(
                "store assigned reserved document id {} to '{}'",
                QUERY_DOCUMENT_ID, title
            )));
        }

        // A failing token lookup must not leave half a document in the buffer
        let mut local = IndexBuffer::new();
        for token in self.tokenizer.segment(body) {
            let token_id = self.dictionary.document_token_id(token.text)?;
            local.record_occurrence(token_id, document_id, token.offset);
        }
        local.note_document();
        self.buffer.absorb(&mut local);

        self.indexed_documents += 1;
        self.state = SessionState::Accumulating;
        info!(
            count = self.indexed_documents,
            document_id, "Indexed document '{}'", title
        );

        self.maybe_flush()?;
        Ok(Some(document_id))
    }

    /// Flush whatever is buffered and return to idle
    pub fn end_batch(&mut self) -> Result<()> {
        self.flush_buffer(SessionState::Idle)
    }

    /// Flush if the buffer holds more distinct tokens than the threshold
    fn maybe_flush(&mut self) -> Result<()> {
        if self.buffer.exceeds(self.settings.buffer_update_threshold) {
            self.flush_buffer(SessionState::Accumulating)?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self, after: SessionState) -> Result<()> {
        if self.buffer.is_empty() {
            self.state = after;
            return Ok(());
        }

        self.state = SessionState::Flushing;
        let started = Instant::now();
        let documents = self.buffer.document_count();
        let fragments = self.buffer.take();
        let total = fragments.len();
        info!(tokens = total, documents, "Flushing index buffer");

        for (written, (token_id, fragment)) in fragments.into_iter().enumerate() {
            if let Err(e) = self.write_token(token_id, fragment) {
                warn!(
                    token_id,
                    written,
                    lost = total - written - 1,
                    "Flush aborted: {}",
                    e
                );
                self.state = after;
                return Err(e);
            }
        }

        self.flushes += 1;
        self.state = after;
        info!(
            tokens = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Flushed index buffer"
        );
        Ok(())
    }

    /// Merge one buffered fragment with the stored postings and write it back
    fn write_token(&self, token_id: TokenId, fragment: TokenFragment) -> Result<()> {
        let merged = match self.store.get_postings(token_id)? {
            Some(record) => {
                let mut stored = TokenFragment::new(codec::decode(&record.blob)?, record.docs_count);
                merge_fragment(&mut stored, fragment);
                stored
            }
            None => fragment,
        };

        let blob = codec::encode(&merged.postings, self.settings.compression)?;
        self.store.put_postings(token_id, merged.docs_count, &blob)?;
        debug!(
            token_id,
            docs_count = merged.docs_count,
            bytes = blob.len(),
            "Wrote postings"
        );
        Ok(())
    }
}
