//! Conjunctive n-gram search
//!
//! Every query token must occur in a matching document. Query tokens are
//! ordered rarest first; the rarest token's cursor drives a leapfrog
//! intersection in which the other cursors seek to the driver's document and
//! the driver seeks past any document another cursor has already skipped.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::{debug, info, warn};

use super::cursor::PostingsCursor;
use super::scoring::tf_idf;
use crate::config::IndexSettings;
use crate::error::Result;
use crate::index::{codec, ResolveContext, TokenDictionary};
use crate::models::{
    DocumentId, Position, PostingsEntry, PostingsList, SearchHit, SearchResult, TokenId,
    QUERY_DOCUMENT_ID,
};
use crate::persistence::Store;
use crate::tokenizer::NgramTokenizer;

/// A distinct query token with its stored postings
#[derive(Clone, Debug)]
pub struct QueryToken {
    pub text: String,
    pub token_id: TokenId,
    pub docs_count: u32,
    /// Occurrences within the query itself, under the reserved query document id
    pub query_occurrences: PostingsEntry,
    pub postings: PostingsList,
}

pub struct Searcher {
    store: Arc<dyn Store>,
    tokenizer: NgramTokenizer,
    dictionary: TokenDictionary,
}

impl Searcher {
    pub fn new(store: Arc<dyn Store>, settings: &IndexSettings) -> Self {
        Self {
            tokenizer: NgramTokenizer::from_settings(settings),
            dictionary: TokenDictionary::new(store.clone()),
            store,
        }
    }

    /// Ranked matches for `query`, best first
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let token_len = self.tokenizer.token_len();
        if NgramTokenizer::char_len(query) < token_len {
            info!("Query '{}' is shorter than the token length {}", query, token_len);
            return Ok(Vec::new());
        }

        let indexed_documents = self.store.document_count()?;
        let Some(tokens) = self.query_tokens(query)? else {
            return Ok(Vec::new());
        };
        debug!(
            tokens = tokens.len(),
            indexed_documents, "Intersecting postings for '{}'", query
        );

        let results = intersect(&tokens, indexed_documents);
        info!("Query '{}' matched {} documents", query, results.len());
        Ok(results)
    }

    /// Search and resolve each result's title.
    ///
    /// A failed title lookup degrades that hit instead of failing the query.
    pub fn search_hits(&self, query: &str) -> Result<Vec<SearchHit>> {
        let hits = self
            .search(query)?
            .iter()
            .map(|result| match self.store.get_document_title(result.document_id) {
                Ok(title) => SearchHit::resolved(result, title),
                Err(e) => {
                    warn!(
                        document_id = result.document_id,
                        "Title lookup failed: {}", e
                    );
                    SearchHit::degraded(result, e.to_string())
                }
            })
            .collect();
        Ok(hits)
    }

    /// Resolve the distinct query tokens, rarest first.
    ///
    /// `None` when some token was never indexed, so nothing can match.
    pub fn query_tokens(&self, query: &str) -> Result<Option<Vec<QueryToken>>> {
        let mut occurrences: BTreeMap<&str, Vec<Position>> = BTreeMap::new();
        for token in self.tokenizer.segment(query) {
            occurrences.entry(token.text).or_default().push(token.offset);
        }
        if occurrences.is_empty() {
            info!("Query '{}' has no indexable tokens", query);
            return Ok(None);
        }

        let mut tokens = Vec::with_capacity(occurrences.len());
        for (text, positions) in occurrences {
            let (token_id, _) = match self.dictionary.resolve(text, ResolveContext::Query) {
                Ok(resolved) => resolved,
                Err(e) if e.is_not_found() => {
                    info!("Token '{}' is not indexed", text);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let Some(record) = self.store.get_postings(token_id)? else {
                info!("Token '{}' has no postings", text);
                return Ok(None);
            };
            let postings = codec::decode(&record.blob)?;
            if postings.is_empty() {
                info!("Token '{}' has no postings", text);
                return Ok(None);
            }

            tokens.push(QueryToken {
                text: text.to_string(),
                token_id,
                docs_count: record.docs_count,
                query_occurrences: PostingsEntry::new(QUERY_DOCUMENT_ID, positions),
                postings,
            });
        }

        tokens.sort_by_key(|t| (t.docs_count, t.token_id));
        for t in &tokens {
            debug!(
                token = %t.text,
                token_id = t.token_id,
                docs_count = t.docs_count,
                query_positions = ?t.query_occurrences.positions,
                "Query token"
            );
        }
        Ok(Some(tokens))
    }
}

/// Intersect the postings of `tokens` (rarest first) and score every match.
///
/// Results are ordered by score descending, then document id ascending.
pub fn intersect(tokens: &[QueryToken], indexed_documents: u64) -> Vec<SearchResult> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut cursors: Vec<PostingsCursor<'_>> =
        tokens.iter().map(|t| PostingsCursor::new(&t.postings)).collect();
    let mut scores: BTreeMap<DocumentId, f64> = BTreeMap::new();

    'driver: while let Some(document_id) = cursors[0].document_id() {
        let mut next_document = None;
        for cursor in cursors[1..].iter_mut() {
            match cursor.seek(document_id) {
                None => break 'driver,
                Some(found) if found > document_id => {
                    next_document = Some(found);
                    break;
                }
                Some(_) => {}
            }
        }

        match next_document {
            Some(target) => {
                if cursors[0].seek(target).is_none() {
                    break;
                }
            }
            None => {
                let score: f64 = cursors
                    .iter()
                    .zip(tokens)
                    .filter_map(|(cursor, token)| {
                        cursor.current().map(|entry| {
                            tf_idf(entry.positions_count(), indexed_documents, token.docs_count)
                        })
                    })
                    .sum();
                *scores.entry(document_id).or_insert(0.0) += score;
                cursors[0].advance();
            }
        }
    }

    rank(scores)
}

fn rank(scores: BTreeMap<DocumentId, f64>) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = scores
        .into_iter()
        .map(|(document_id, score)| SearchResult::new(document_id, score))
        .collect();
    results.sort_by_key(|r| (Reverse(OrderedFloat(r.score)), r.document_id));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexSession;
    use crate::persistence::MemoryStore;

    fn token(text: &str, token_id: TokenId, docs: &[(DocumentId, u32)]) -> QueryToken {
        let entries = docs
            .iter()
            .map(|&(doc, tf)| PostingsEntry::new(doc, (0..tf).collect()))
            .collect();
        QueryToken {
            text: text.to_string(),
            token_id,
            docs_count: docs.len() as u32,
            query_occurrences: PostingsEntry::single(QUERY_DOCUMENT_ID, 0),
            postings: PostingsList::from_entries(entries).unwrap(),
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<DocumentId> {
        results.iter().map(|r| r.document_id).collect()
    }

    #[test]
    fn test_single_token_ranks_by_frequency() {
        let t = token("日本", 1, &[(1, 3), (2, 2), (3, 1)]);
        let results = intersect(&[t], 3);
        assert_eq!(ids(&results), vec![1, 2, 3]);
        assert_eq!(results[0].score, 3.0);
        assert_eq!(results[2].score, 1.0);
    }

    #[test]
    fn test_leapfrog_intersection() {
        let rare = token("東京", 1, &[(4, 1), (9, 1), (15, 1)]);
        let common = token("日本", 2, &[(1, 1), (2, 1), (4, 2), (7, 1), (15, 1), (20, 1)]);
        let mid = token("本語", 3, &[(4, 1), (8, 1), (10, 1), (15, 3)]);

        let results = intersect(&[rare, mid, common], 20);
        let mut matched = ids(&results);
        matched.sort_unstable();
        assert_eq!(matched, vec![4, 15]);

        // 15: 1*20/3 + 3*20/4 + 1*20/6, 4: 1*20/3 + 1*20/4 + 2*20/6
        assert_eq!(results[0].document_id, 15);
        let expected = 20.0 / 3.0 + 3.0 * 5.0 + 20.0 / 6.0;
        assert!((results[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_lists_match_nothing() {
        let a = token("日本", 1, &[(1, 1), (3, 1)]);
        let b = token("東京", 2, &[(2, 1), (4, 1)]);
        assert!(intersect(&[a, b], 4).is_empty());
        assert!(intersect(&[], 4).is_empty());
    }

    #[test]
    fn test_query_tokens_are_rarest_first() {
        let store = Arc::new(MemoryStore::new());
        let settings = IndexSettings::default();
        let mut session = IndexSession::new(store.clone(), settings.clone()).unwrap();
        session.add_document("一", "日本").unwrap();
        session.add_document("二", "日本語").unwrap();
        session.end_batch().unwrap();

        let searcher = Searcher::new(store, &settings);
        let tokens = searcher.query_tokens("日本語").unwrap().unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["本語", "日本"]);
        assert_eq!(tokens[0].docs_count, 1);
        assert_eq!(tokens[0].query_occurrences.document_id, QUERY_DOCUMENT_ID);
        assert_eq!(tokens[0].query_occurrences.positions, vec![1]);
        assert_eq!(tokens[1].query_occurrences.positions, vec![0]);

        // a token that was never indexed means nothing can match
        assert!(searcher.query_tokens("語日").unwrap().is_none());
    }

    #[test]
    fn test_failed_title_lookup_degrades_one_hit() {
        let store = Arc::new(MemoryStore::new());
        let settings = IndexSettings::default();
        let mut session = IndexSession::new(store.clone(), settings.clone()).unwrap();
        let first = session.add_document("一", "日本").unwrap().unwrap();
        let second = session.add_document("二", "日本語").unwrap().unwrap();
        session.end_batch().unwrap();

        store.fail_title_lookups(first);
        let searcher = Searcher::new(store, &settings);
        let hits = searcher.search_hits("日本").unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, first);
        assert_eq!(hits[0].title, None);
        assert!(hits[0].lookup_error.is_some());
        assert_eq!(hits[1].document_id, second);
        assert_eq!(hits[1].title.as_deref(), Some("二"));
        assert!(hits[1].lookup_error.is_none());
    }

    #[test]
    fn test_ties_break_by_document_id() {
        let t = token("日本", 1, &[(2, 1), (5, 1), (9, 1)]);
        let results = intersect(&[t], 3);
        assert_eq!(ids(&results), vec![2, 5, 9]);
    }
}
