//! Sorted two-way merges of postings lists and index fragments
//!
//! Both operations are a single linear two-pointer walk; nothing is re-sorted.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Position, PostingsEntry, PostingsList, TokenId};

/// Postings for one token plus its document-frequency counter
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFragment {
    pub postings: PostingsList,
    pub docs_count: u32,
}

impl TokenFragment {
    pub fn new(postings: PostingsList, docs_count: u32) -> Self {
        Self {
            postings,
            docs_count,
        }
    }

    /// Fragment whose counter is derived from its own entries
    pub fn from_postings(postings: PostingsList) -> Self {
        let docs_count = postings.document_frequency();
        Self {
            postings,
            docs_count,
        }
    }
}

/// Token id to fragment, iterated in ascending token id order
pub type IndexFragments = BTreeMap<TokenId, TokenFragment>;

/// Merge two postings lists into one list ascending by document id.
///
/// Entries for the same document are combined into one entry whose
/// positions are the ascending merge of both inputs.
pub fn merge_postings_lists(a: PostingsList, b: PostingsList) -> PostingsList {
    merge_counting_shared(a, b).0
}

/// Merge `source` into `target`, combining postings and counters.
///
/// The counter of the result is the sum of both counters minus the documents
/// present in both lists, so a document is never counted twice.
pub fn merge_fragment(target: &mut TokenFragment, source: TokenFragment) {
    let postings = std::mem::take(&mut target.postings);
    let (merged, shared) = merge_counting_shared(postings, source.postings);
    target.postings = merged;
    target.docs_count = (target.docs_count + source.docs_count).saturating_sub(shared);
}

/// Fold every fragment of `source` into `target`, leaving `source` empty
pub fn merge_index_fragments(target: &mut IndexFragments, source: &mut IndexFragments) {
    for (token_id, fragment) in std::mem::take(source) {
        match target.entry(token_id) {
            Entry::Vacant(slot) => {
                slot.insert(fragment);
            }
            Entry::Occupied(mut slot) => merge_fragment(slot.get_mut(), fragment),
        }
    }
}

fn merge_counting_shared(a: PostingsList, b: PostingsList) -> (PostingsList, u32) {
    match (a.last_document(), b.first_document()) {
        (None, _) => return (b, 0),
        (_, None) => return (a, 0),
        (Some(a_last), Some(b_first)) if a_last < b_first => {
            let mut a = a;
            a.extend_sorted(b.into_entries());
            return (a, 0);
        }
        _ => {}
    }
    if let (Some(b_last), Some(a_first)) = (b.last_document(), a.first_document()) {
        if b_last < a_first {
            let mut b = b;
            b.extend_sorted(a.into_entries());
            return (b, 0);
        }
    }

    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut shared = 0;
    let mut left = a.into_entries().into_iter().peekable();
    let mut right = b.into_entries().into_iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.document_id.cmp(&r.document_id),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => merged.extend(left.next()),
            Ordering::Greater => merged.extend(right.next()),
            Ordering::Equal => {
                if let (Some(l), Some(r)) = (left.next(), right.next()) {
                    shared += 1;
                    merged.push(PostingsEntry::new(
                        l.document_id,
                        merge_positions(l.positions, r.positions),
                    ));
                }
            }
        }
    }

    (PostingsList::from_sorted(merged), shared)
}

fn merge_positions(a: Vec<Position>, b: Vec<Position>) -> Vec<Position> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }

    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] <= b[j] {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[(u64, &[Position])]) -> PostingsList {
        PostingsList::from_entries(
            entries
                .iter()
                .map(|(doc, pos)| PostingsEntry::new(*doc, pos.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_merge_interleaved_lists() {
        let a = list(&[(1, &[3]), (5, &[1])]);
        let b = list(&[(1, &[9]), (3, &[2])]);
        let merged = merge_postings_lists(a, b);
        assert_eq!(merged, list(&[(1, &[3, 9]), (3, &[2]), (5, &[1])]));
    }

    #[test]
    fn test_merge_positions_sorted_across_passes() {
        let a = list(&[(2, &[4, 10])]);
        let b = list(&[(2, &[1, 7, 12])]);
        let merged = merge_postings_lists(a, b);
        assert_eq!(merged.get(2).unwrap().positions, vec![1, 4, 7, 10, 12]);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = list(&[(1, &[0, 5]), (4, &[2]), (9, &[1])]);
        let b = list(&[(2, &[3]), (4, &[1, 8]), (10, &[0])]);
        assert_eq!(
            merge_postings_lists(a.clone(), b.clone()),
            merge_postings_lists(b, a)
        );
    }

    #[test]
    fn test_merge_is_associative() {
        let a = list(&[(1, &[0]), (7, &[2])]);
        let b = list(&[(1, &[4]), (3, &[1])]);
        let c = list(&[(3, &[0]), (7, &[1]), (8, &[5])]);

        let left = merge_postings_lists(merge_postings_lists(a.clone(), b.clone()), c.clone());
        let right = merge_postings_lists(a, merge_postings_lists(b, c));
        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_disjoint_ranges_and_empty() {
        let low = list(&[(1, &[0]), (2, &[0])]);
        let high = list(&[(5, &[0])]);
        let expected = list(&[(1, &[0]), (2, &[0]), (5, &[0])]);
        assert_eq!(merge_postings_lists(low.clone(), high.clone()), expected);
        assert_eq!(merge_postings_lists(high, low.clone()), expected);
        assert_eq!(merge_postings_lists(low.clone(), PostingsList::new()), low);
        assert_eq!(merge_postings_lists(PostingsList::new(), low.clone()), low);
    }

    #[test]
    fn test_merge_fragment_counts_shared_documents_once() {
        let mut stored = TokenFragment::from_postings(list(&[(1, &[0]), (2, &[3])]));
        let buffered = TokenFragment::from_postings(list(&[(2, &[5]), (6, &[1])]));
        merge_fragment(&mut stored, buffered);

        assert_eq!(stored.docs_count, 3);
        assert_eq!(stored.postings.document_frequency(), 3);
    }

    #[test]
    fn test_merge_fragment_disjoint_sums_counters() {
        let mut stored = TokenFragment::from_postings(list(&[(1, &[0]), (2, &[3])]));
        let buffered = TokenFragment::from_postings(list(&[(3, &[5])]));
        merge_fragment(&mut stored, buffered);
        assert_eq!(stored.docs_count, 3);
    }

    #[test]
    fn test_merge_index_fragments_consumes_source() {
        let mut target = IndexFragments::new();
        target.insert(1, TokenFragment::from_postings(list(&[(1, &[0])])));

        let mut source = IndexFragments::new();
        source.insert(1, TokenFragment::from_postings(list(&[(2, &[4])])));
        source.insert(7, TokenFragment::from_postings(list(&[(2, &[5])])));

        merge_index_fragments(&mut target, &mut source);

        assert!(source.is_empty());
        assert_eq!(target.len(), 2);
        assert_eq!(target[&1].docs_count, 2);
        assert_eq!(target[&1].postings, list(&[(1, &[0]), (2, &[4])]));
        assert_eq!(target[&7].docs_count, 1);
    }
}
