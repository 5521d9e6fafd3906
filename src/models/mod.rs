pub mod document;
pub mod postings;
pub mod search;

pub use document::{Document, DocumentId, RawDocument, QUERY_DOCUMENT_ID};
pub use postings::{Position, PostingsEntry, PostingsList, TokenId};
pub use search::{SearchHit, SearchResult, UNKNOWN_TITLE};
