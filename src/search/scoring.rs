//! TF-IDF scoring
//!
//! idf is the plain ratio of indexed documents to the token's document
//! frequency (no logarithm), computed in floating point.

/// `indexed_documents / document_frequency`, or 0 for a token in no document
pub fn inverse_document_frequency(indexed_documents: u64, document_frequency: u32) -> f64 {
    if document_frequency == 0 {
        return 0.0;
    }
    indexed_documents as f64 / document_frequency as f64
}

/// Contribution of one token to a document's score
pub fn tf_idf(term_frequency: u32, indexed_documents: u64, document_frequency: u32) -> f64 {
    term_frequency as f64 * inverse_document_frequency(indexed_documents, document_frequency)
}
