use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::{Mutex, RwLock};

use super::store::{PostingsRecord, Store};
use crate::error::{GramdexError, Result};
use crate::models::{Document, DocumentId, TokenId};

#[derive(Debug)]
struct TokenEntry {
    text: String,
    postings: Option<PostingsRecord>,
}

#[derive(Debug)]
struct Inner {
    documents: BTreeMap<DocumentId, Document>,
    titles: HashMap<String, DocumentId>,
    token_ids: HashMap<String, TokenId>,
    tokens: BTreeMap<TokenId, TokenEntry>,
    next_document_id: DocumentId,
    next_token_id: TokenId,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
            titles: HashMap::new(),
            token_ids: HashMap::new(),
            tokens: BTreeMap::new(),
            next_document_id: 1,
            next_token_id: 1,
        }
    }
}

/// Injected failures, checked before touching the maps
#[derive(Debug, Default)]
struct Faults {
    /// Remaining successful `put_postings` calls before writes start failing
    put_budget: Option<usize>,
    token_lookups: HashSet<String>,
    title_lookups: HashSet<DocumentId>,
}

/// In-process store backed by ordered maps.
///
/// Supports failure injection on postings writes, token lookups and title
/// lookups for exercising partial flushes and degraded results.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the next `n` postings writes succeed and fail every one after
    pub fn fail_puts_after(&self, n: usize) {
        self.faults.lock().put_budget = Some(n);
    }

    /// Make `get_token_id` report `token` as missing, even once registered
    pub fn fail_token_lookups(&self, token: &str) {
        self.faults.lock().token_lookups.insert(token.to_string());
    }

    /// Make `get_document_title` fail for `document_id`
    pub fn fail_title_lookups(&self, document_id: DocumentId) {
        self.faults.lock().title_lookups.insert(document_id);
    }

    pub fn clear_failures(&self) {
        *self.faults.lock() = Faults::default();
    }

    /// Number of registered tokens
    pub fn token_count(&self) -> usize {
        self.inner.read().tokens.len()
    }
}

impl Store for MemoryStore {
    fn upsert_document(&self, title: &str, body: &str) -> Result<DocumentId> {
        let mut inner = self.inner.write();
        if let Some(&id) = inner.titles.get(title) {
            if let Some(doc) = inner.documents.get_mut(&id) {
                doc.body = body.to_string();
            }
            return Ok(id);
        }

        let id = inner.next_document_id;
        inner.next_document_id += 1;
        inner.titles.insert(title.to_string(), id);
        inner.documents.insert(id, Document::new(id, title, body));
        Ok(id)
    }

    fn get_document_id(&self, title: &str) -> Result<DocumentId> {
        self.inner
            .read()
            .titles
            .get(title)
            .copied()
            .ok_or_else(|| GramdexError::not_found(format!("document titled '{}'", title)))
    }

    fn get_document_title(&self, document_id: DocumentId) -> Result<String> {
        if self.faults.lock().title_lookups.contains(&document_id) {
            return Err(GramdexError::store(format!(
                "injected failure reading title of document {}",
                document_id
            )));
        }
        self.get_document(document_id).map(|doc| doc.title)
    }

    fn get_document(&self, document_id: DocumentId) -> Result<Document> {
        self.inner
            .read()
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| GramdexError::not_found(format!("document {}", document_id)))
    }

    fn document_count(&self) -> Result<u64> {
        Ok(self.inner.read().documents.len() as u64)
    }

    fn ensure_token(&self, token: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.token_ids.contains_key(token) {
            return Ok(());
        }
        let id = inner.next_token_id;
        inner.next_token_id += 1;
        inner.token_ids.insert(token.to_string(), id);
        inner.tokens.insert(
            id,
            TokenEntry {
                text: token.to_string(),
                postings: None,
            },
        );
        Ok(())
    }

    fn get_token_id(&self, token: &str) -> Result<(TokenId, u32)> {
        if self.faults.lock().token_lookups.contains(token) {
            return Err(GramdexError::not_found(format!("token '{}'", token)));
        }
        let inner = self.inner.read();
        let id = *inner
            .token_ids
            .get(token)
            .ok_or_else(|| GramdexError::not_found(format!("token '{}'", token)))?;
        let docs_count = inner
            .tokens
            .get(&id)
            .and_then(|entry| entry.postings.as_ref())
            .map_or(0, |record| record.docs_count);
        Ok((id, docs_count))
    }

    fn get_token(&self, token_id: TokenId) -> Result<String> {
        self.inner
            .read()
            .tokens
            .get(&token_id)
            .map(|entry| entry.text.clone())
            .ok_or_else(|| GramdexError::not_found(format!("token id {}", token_id)))
    }

    fn get_postings(&self, token_id: TokenId) -> Result<Option<PostingsRecord>> {
        Ok(self
            .inner
            .read()
            .tokens
            .get(&token_id)
            .and_then(|entry| entry.postings.clone()))
    }

    fn put_postings(&self, token_id: TokenId, docs_count: u32, blob: &[u8]) -> Result<()> {
        {
            let mut faults = self.faults.lock();
            if let Some(remaining) = faults.put_budget.as_mut() {
                if *remaining == 0 {
                    return Err(GramdexError::store(format!(
                        "injected failure writing postings for token {}",
                        token_id
                    )));
                }
                *remaining -= 1;
            }
        }

        let mut inner = self.inner.write();
        let entry = inner
            .tokens
            .get_mut(&token_id)
            .ok_or_else(|| GramdexError::not_found(format!("token id {}", token_id)))?;
        entry.postings = Some(PostingsRecord {
            docs_count,
            blob: blob.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_keeps_id() {
        let store = MemoryStore::new();
        let a = store.upsert_document("東京", "首都").unwrap();
        let b = store.upsert_document("大阪", "都市").unwrap();
        let again = store.upsert_document("東京", "日本の首都").unwrap();

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(store.document_count().unwrap(), 2);
        assert_eq!(store.get_document(a).unwrap().body, "日本の首都");
        assert_eq!(store.get_document_id("大阪").unwrap(), b);
        assert_eq!(store.get_document_title(b).unwrap(), "大阪");
    }

    #[test]
    fn test_ensure_token_is_idempotent() {
        let store = MemoryStore::new();
        store.ensure_token("日本").unwrap();
        let (id, df) = store.get_token_id("日本").unwrap();
        assert_eq!(df, 0);

        store.put_postings(id, 4, b"blob").unwrap();
        store.ensure_token("日本").unwrap();

        assert_eq!(store.get_token_id("日本").unwrap(), (id, 4));
        assert_eq!(store.get_postings(id).unwrap().unwrap().blob, b"blob");
        assert_eq!(store.get_token(id).unwrap(), "日本");
        assert_eq!(store.token_count(), 1);
    }

    #[test]
    fn test_missing_records() {
        let store = MemoryStore::new();
        assert!(store.get_token_id("京都").unwrap_err().is_not_found());
        assert!(store.get_document_title(9).unwrap_err().is_not_found());
        assert!(store.get_postings(9).unwrap().is_none());
        assert!(store.put_postings(9, 1, b"x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_fail_puts_after() {
        let store = MemoryStore::new();
        store.ensure_token("日本").unwrap();
        let (id, _) = store.get_token_id("日本").unwrap();

        store.fail_puts_after(1);
        assert!(store.put_postings(id, 1, b"a").is_ok());
        let err = store.put_postings(id, 2, b"b").unwrap_err();
        assert!(err.is_retriable());

        store.clear_failures();
        assert!(store.put_postings(id, 2, b"b").is_ok());
    }

    #[test]
    fn test_fail_lookups() {
        let store = MemoryStore::new();
        let doc = store.upsert_document("東京", "首都").unwrap();
        store.ensure_token("首都").unwrap();

        store.fail_token_lookups("首都");
        store.fail_title_lookups(doc);
        assert!(store.get_token_id("首都").unwrap_err().is_not_found());
        let err = store.get_document_title(doc).unwrap_err();
        assert!(matches!(err, GramdexError::Store(_)));
        assert_eq!(store.get_document(doc).unwrap().title, "東京");

        store.clear_failures();
        assert!(store.get_token_id("首都").is_ok());
        assert_eq!(store.get_document_title(doc).unwrap(), "東京");
    }
}
