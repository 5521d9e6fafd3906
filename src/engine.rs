use std::sync::Arc;

use tracing::info;

use crate::config::{EngineConfig, IndexSettings};
use crate::error::Result;
use crate::index::{codec, IndexSession, TokenFragment};
use crate::models::{SearchHit, SearchResult, TokenId};
use crate::persistence::{FjallStore, MemoryStore, Store};
use crate::search::Searcher;

/// Entry point tying a store to index settings
pub struct Gramdex {
    store: Arc<dyn Store>,
    settings: IndexSettings,
}

impl Gramdex {
    /// Open (or create) a persistent index under `config.data_dir`
    pub fn open(config: &EngineConfig) -> Result<Self> {
        config.settings.validate()?;
        let store = FjallStore::open(config.store_dir())?;
        info!(
            "Opened index at {:?} (token_len={}, compression={})",
            config.store_dir(),
            config.settings.token_len,
            config.settings.compression
        );
        Ok(Self {
            store: Arc::new(store),
            settings: config.settings.clone(),
        })
    }

    /// Index held entirely in memory
    pub fn in_memory(settings: IndexSettings) -> Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()), settings)
    }

    pub fn with_store(store: Arc<dyn Store>, settings: IndexSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { store, settings })
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Start an indexing session with its own buffer
    pub fn session(&self) -> Result<IndexSession> {
        IndexSession::new(self.store.clone(), self.settings.clone())
    }

    pub fn searcher(&self) -> Searcher {
        Searcher::new(self.store.clone(), &self.settings)
    }

    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.searcher().search(query)
    }

    pub fn search_hits(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.searcher().search_hits(query)
    }

    pub fn document_count(&self) -> Result<u64> {
        self.store.document_count()
    }

    /// Stored postings of one token, decoded. `None` if never flushed.
    pub fn dump_token(&self, token_id: TokenId) -> Result<Option<(String, TokenFragment)>> {
        let text = self.store.get_token(token_id)?;
        let Some(record) = self.store.get_postings(token_id)? else {
            return Ok(None);
        };
        let postings = codec::decode(&record.blob)?;
        Ok(Some((text, TokenFragment::new(postings, record.docs_count))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let engine = Gramdex::in_memory(IndexSettings::default()).unwrap();
        let mut session = engine.session().unwrap();
        let id = session.add_document("東京", "日本の首都").unwrap().unwrap();
        session.end_batch().unwrap();

        let results = engine.search("首都").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_id, id);

        let hits = engine.search_hits("首都").unwrap();
        assert_eq!(hits[0].display_title(), "東京");

        let (token_id, _) = engine.store().get_token_id("首都").unwrap();
        let (text, fragment) = engine.dump_token(token_id).unwrap().unwrap();
        assert_eq!(text, "首都");
        assert_eq!(fragment.docs_count, 1);
        assert_eq!(fragment.postings.get(id).unwrap().positions, vec![3]);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = IndexSettings::default().with_buffer_update_threshold(0);
        assert!(Gramdex::in_memory(settings).is_err());
    }
}
