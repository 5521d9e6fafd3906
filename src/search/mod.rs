//! Query execution: postings cursors, TF-IDF scoring and AND intersection

pub mod cursor;
pub mod scoring;
pub mod searcher;

pub use cursor::PostingsCursor;
pub use scoring::{inverse_document_frequency, tf_idf};
pub use searcher::{intersect, QueryToken, Searcher};
