use serde::{Deserialize, Serialize};

/// Store-assigned document identifier
pub type DocumentId = u64;

/// Document id reserved for occurrences that belong to a query.
///
/// The store never assigns it, and nothing carrying it is ever persisted.
pub const QUERY_DOCUMENT_ID: DocumentId = 0;

/// A stored document. The title is the natural key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub body: String,
}

impl Document {
    pub fn new(id: DocumentId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A `(title, body)` record as produced by an ingestion source
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl RawDocument {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Documents with an empty title or body are never indexed
    pub fn is_indexable(&self) -> bool {
        !self.title.is_empty() && !self.body.is_empty()
    }
}
