use std::fmt::Display;
use std::path::{Path, PathBuf};

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::store::{PostingsRecord, Store};
use crate::error::{GramdexError, Result};
use crate::models::{Document, DocumentId, TokenId};

const DOCUMENTS_KS: &str = "documents";
const TITLES_KS: &str = "titles";
const TOKEN_IDS_KS: &str = "token_ids";
const TOKENS_KS: &str = "tokens";
const META_KS: &str = "meta";

const NEXT_DOCUMENT_ID_KEY: &[u8] = b"next_document_id";
const NEXT_TOKEN_ID_KEY: &[u8] = b"next_token_id";
const DOCUMENT_COUNT_KEY: &[u8] = b"document_count";

/// Token record as persisted under its id
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenRecord {
    text: String,
    postings: Option<PostingsRecord>,
}

fn store_err<E: Display>(context: &str) -> impl FnOnce(E) -> GramdexError + '_ {
    move |e| GramdexError::store(format!("{}: {}", context, e))
}

fn open_err<E: Display>(name: &str, e: E) -> GramdexError {
    GramdexError::store(format!("failed to open {} keyspace: {}", name, e))
}

fn encode_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let buf: [u8; 8] = bytes
        .try_into()
        .map_err(|_| GramdexError::store(format!("expected 8-byte value, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(buf))
}

/// Fjall-backed persistent store.
///
/// Ids come from persisted counters and are never reused. Writers that
/// allocate ids are serialized through an internal lock.
pub struct FjallStore {
    base_dir: PathBuf,
    _db: Database,
    documents: Keyspace,
    titles: Keyspace,
    token_ids: Keyspace,
    tokens: Keyspace,
    meta: Keyspace,
    alloc: Mutex<()>,
}

impl FjallStore {
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        let db = Database::builder(&base_dir)
            .open()
            .map_err(|e| GramdexError::store(format!("failed to open fjall store: {}", e)))?;

        let documents = db
            .keyspace(DOCUMENTS_KS, || KeyspaceCreateOptions::default())
            .map_err(|e| open_err(DOCUMENTS_KS, e))?;
        let titles = db
            .keyspace(TITLES_KS, || KeyspaceCreateOptions::default())
            .map_err(|e| open_err(TITLES_KS, e))?;
        let token_ids = db
            .keyspace(TOKEN_IDS_KS, || KeyspaceCreateOptions::default())
            .map_err(|e| open_err(TOKEN_IDS_KS, e))?;
        let tokens = db
            .keyspace(TOKENS_KS, || KeyspaceCreateOptions::default())
            .map_err(|e| open_err(TOKENS_KS, e))?;
        let meta = db
            .keyspace(META_KS, || KeyspaceCreateOptions::default())
            .map_err(|e| open_err(META_KS, e))?;

        let store = Self {
            base_dir,
            _db: db,
            documents,
            titles,
            token_ids,
            tokens,
            meta,
            alloc: Mutex::new(()),
        };
        info!(
            path = %store.base_dir.display(),
            documents = store.read_counter(DOCUMENT_COUNT_KEY, 0)?,
            "opened fjall store"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    fn read_counter(&self, key: &[u8], default: u64) -> Result<u64> {
        match self.meta.get(key).map_err(store_err("reading counter"))? {
            Some(val) => decode_u64(&val),
            None => Ok(default),
        }
    }

    fn write_counter(&self, key: &[u8], value: u64) -> Result<()> {
        self.meta
            .insert(key, encode_id(value))
            .map_err(store_err("writing counter"))
    }

    /// Take the next id from a persisted counter. Ids start at 1.
    fn allocate(&self, key: &[u8]) -> Result<u64> {
        let id = self.read_counter(key, 1)?;
        self.write_counter(key, id + 1)?;
        Ok(id)
    }

    fn load_token_record(&self, token_id: TokenId) -> Result<TokenRecord> {
        let val = self
            .tokens
            .get(encode_id(token_id))
            .map_err(store_err("reading token record"))?
            .ok_or_else(|| GramdexError::not_found(format!("token id {}", token_id)))?;
        Ok(bincode::deserialize(&val)?)
    }

    fn save_token_record(&self, token_id: TokenId, record: &TokenRecord) -> Result<()> {
        let val = bincode::serialize(record)?;
        self.tokens
            .insert(encode_id(token_id), val)
            .map_err(store_err("writing token record"))
    }
}

impl Store for FjallStore {
    fn upsert_document(&self, title: &str, body: &str) -> Result<DocumentId> {
        let _guard = self.alloc.lock();

        let id = match self
            .titles
            .get(title.as_bytes())
            .map_err(store_err("reading title index"))?
        {
            Some(val) => decode_u64(&val)?,
            None => {
                let id = self.allocate(NEXT_DOCUMENT_ID_KEY)?;
                self.titles
                    .insert(title.as_bytes(), encode_id(id))
                    .map_err(store_err("writing title index"))?;
                let count = self.read_counter(DOCUMENT_COUNT_KEY, 0)?;
                self.write_counter(DOCUMENT_COUNT_KEY, count + 1)?;
                id
            }
        };

        let doc = Document::new(id, title, body);
        let val = bincode::serialize(&doc)?;
        self.documents
            .insert(encode_id(id), val)
            .map_err(store_err("writing document"))?;
        Ok(id)
    }

    fn get_document_id(&self, title: &str) -> Result<DocumentId> {
        let val = self
            .titles
            .get(title.as_bytes())
            .map_err(store_err("reading title index"))?
            .ok_or_else(|| GramdexError::not_found(format!("document titled '{}'", title)))?;
        decode_u64(&val)
    }

    fn get_document_title(&self, document_id: DocumentId) -> Result<String> {
        self.get_document(document_id).map(|doc| doc.title)
    }

    fn get_document(&self, document_id: DocumentId) -> Result<Document> {
        let val = self
            .documents
            .get(encode_id(document_id))
            .map_err(store_err("reading document"))?
            .ok_or_else(|| GramdexError::not_found(format!("document {}", document_id)))?;
        Ok(bincode::deserialize(&val)?)
    }

    fn document_count(&self) -> Result<u64> {
        self.read_counter(DOCUMENT_COUNT_KEY, 0)
    }

    fn ensure_token(&self, token: &str) -> Result<()> {
        let _guard = self.alloc.lock();
        if self
            .token_ids
            .get(token.as_bytes())
            .map_err(store_err("reading token id"))?
            .is_some()
        {
            return Ok(());
        }

        let id = self.allocate(NEXT_TOKEN_ID_KEY)?;
        self.save_token_record(
            id,
            &TokenRecord {
                text: token.to_string(),
                postings: None,
            },
        )?;
        self.token_ids
            .insert(token.as_bytes(), encode_id(id))
            .map_err(store_err("writing token id"))
    }

    fn get_token_id(&self, token: &str) -> Result<(TokenId, u32)> {
        let val = self
            .token_ids
            .get(token.as_bytes())
            .map_err(store_err("reading token id"))?
            .ok_or_else(|| GramdexError::not_found(format!("token '{}'", token)))?;
        let id = decode_u64(&val)?;
        let record = self.load_token_record(id)?;
        Ok((id, record.postings.map_or(0, |p| p.docs_count)))
    }

    fn get_token(&self, token_id: TokenId) -> Result<String> {
        self.load_token_record(token_id).map(|record| record.text)
    }

    fn get_postings(&self, token_id: TokenId) -> Result<Option<PostingsRecord>> {
        match self.load_token_record(token_id) {
            Ok(record) => Ok(record.postings),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put_postings(&self, token_id: TokenId, docs_count: u32, blob: &[u8]) -> Result<()> {
        let mut record = self.load_token_record(token_id)?;
        record.postings = Some(PostingsRecord {
            docs_count,
            blob: blob.to_vec(),
        });
        self.save_token_record(token_id, &record)
    }
}
