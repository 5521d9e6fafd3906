use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::models::TokenId;
use crate::persistence::Store;

/// Whether a token is being resolved for a stored document or for a query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveContext {
    /// Indexing: the token is registered first if it is new
    Document,
    /// Query: lookup only, unknown tokens are `NotFound`
    Query,
}

/// Resolves token text to its id and document frequency
pub struct TokenDictionary {
    store: Arc<dyn Store>,
    /// Ids already resolved in document context; ids never change once assigned
    cache: HashMap<String, TokenId>,
}

impl TokenDictionary {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolve `token` to `(token id, stored document frequency)`.
    ///
    /// In document context the token is registered in the store first.
    pub fn resolve(&self, token: &str, context: ResolveContext) -> Result<(TokenId, u32)> {
        if context == ResolveContext::Document {
            self.store.ensure_token(token)?;
        }
        self.store.get_token_id(token)
    }

    /// Id of a token seen in a document, registering it on first sight
    pub fn document_token_id(&mut self, token: &str) -> Result<TokenId> {
        if let Some(&id) = self.cache.get(token) {
            return Ok(id);
        }
        let (id, _) = self.resolve(token, ResolveContext::Document)?;
        trace!(token, token_id = id, "resolved token");
        self.cache.insert(token.to_string(), id);
        Ok(id)
    }

    pub fn cached_tokens(&self) -> usize {
        self.cache.len()
    }
}
