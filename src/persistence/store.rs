use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Document, DocumentId, TokenId};

/// Stored postings for one token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingsRecord {
    pub docs_count: u32,
    pub blob: Vec<u8>,
}

/// Storage backend for documents, the token dictionary and postings.
///
/// Lookups of absent documents or tokens fail with `NotFound`; absent
/// postings are `Ok(None)`. Implementations must never reuse an id.
pub trait Store: Send + Sync {
    /// Insert the document if its title is unseen, else replace the body
    /// keeping the id
    fn upsert_document(&self, title: &str, body: &str) -> Result<DocumentId>;

    fn get_document_id(&self, title: &str) -> Result<DocumentId>;

    fn get_document_title(&self, document_id: DocumentId) -> Result<String>;

    fn get_document(&self, document_id: DocumentId) -> Result<Document>;

    /// Number of stored documents
    fn document_count(&self) -> Result<u64>;

    /// Register a token; repeat calls leave its record untouched
    fn ensure_token(&self, token: &str) -> Result<()>;

    /// Token id and stored document frequency
    fn get_token_id(&self, token: &str) -> Result<(TokenId, u32)>;

    fn get_token(&self, token_id: TokenId) -> Result<String>;

    fn get_postings(&self, token_id: TokenId) -> Result<Option<PostingsRecord>>;

    /// Replace the token's postings record
    fn put_postings(&self, token_id: TokenId, docs_count: u32, blob: &[u8]) -> Result<()>;
}
