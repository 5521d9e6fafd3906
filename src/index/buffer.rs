use super::merge::{merge_index_fragments, IndexFragments, TokenFragment};
use crate::models::{DocumentId, Position, TokenId};

/// In-memory accumulator of index fragments.
///
/// Owned by exactly one session; never shared.
#[derive(Debug, Default)]
pub struct IndexBuffer {
    fragments: IndexFragments,
    documents: usize,
}

impl IndexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one occurrence of `token_id` in `document_id`
    pub fn record_occurrence(
        &mut self,
        token_id: TokenId,
        document_id: DocumentId,
        position: Position,
    ) {
        let fragment = self
            .fragments
            .entry(token_id)
            .or_insert_with(TokenFragment::default);
        if fragment.postings.record(document_id, position) {
            fragment.docs_count += 1;
        }
    }

    /// Count one more buffered document
    pub fn note_document(&mut self) {
        self.documents += 1;
    }

    /// Distinct token ids currently buffered
    pub fn token_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty() && self.documents == 0
    }

    /// Whether the distinct token count is past `threshold`
    pub fn exceeds(&self, threshold: usize) -> bool {
        self.token_count() > threshold
    }

    /// Fold another buffer into this one, leaving `other` empty
    pub fn absorb(&mut self, other: &mut IndexBuffer) {
        merge_index_fragments(&mut self.fragments, &mut other.fragments);
        self.documents += std::mem::take(&mut other.documents);
    }

    /// Remove and return all fragments, resetting the document counter
    pub fn take(&mut self) -> IndexFragments {
        self.documents = 0;
        std::mem::take(&mut self.fragments)
    }

    pub fn fragments(&self) -> &IndexFragments {
        &self.fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_occurrence_counts_documents_once() {
        let mut buffer = IndexBuffer::new();
        buffer.record_occurrence(7, 1, 0);
        buffer.record_occurrence(7, 1, 3);
        buffer.record_occurrence(7, 2, 1);
        buffer.record_occurrence(8, 2, 2);

        assert_eq!(buffer.token_count(), 2);
        let fragment = &buffer.fragments()[&7];
        assert_eq!(fragment.docs_count, 2);
        assert_eq!(fragment.postings.get(1).unwrap().positions, vec![0, 3]);
    }

    #[test]
    fn test_absorb_and_take() {
        let mut session = IndexBuffer::new();
        session.record_occurrence(1, 1, 0);
        session.note_document();

        let mut doc = IndexBuffer::new();
        doc.record_occurrence(1, 2, 5);
        doc.record_occurrence(2, 2, 6);
        doc.note_document();

        session.absorb(&mut doc);
        assert!(doc.is_empty());
        assert_eq!(session.document_count(), 2);
        assert_eq!(session.token_count(), 2);
        assert_eq!(session.fragments()[&1].docs_count, 2);
        assert!(session.exceeds(1));
        assert!(!session.exceeds(2));

        let fragments = session.take();
        assert_eq!(fragments.len(), 2);
        assert!(session.is_empty());
    }
}
