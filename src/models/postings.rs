//! Postings data model
//!
//! A postings list is an owned, contiguous sequence of entries sorted strictly
//! ascending by document id. Every constructor that accepts foreign entries
//! validates that ordering, so a `PostingsList` value is always valid.

use serde::{Deserialize, Serialize};

use super::document::DocumentId;

/// Permanent numeric id of a token in the dictionary
pub type TokenId = u64;

/// Character offset of a token occurrence within a document
pub type Position = u32;

/// Occurrences of one token in one document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingsEntry {
    pub document_id: DocumentId,
    /// Ascending character offsets
    pub positions: Vec<Position>,
}

impl PostingsEntry {
    pub fn new(document_id: DocumentId, positions: Vec<Position>) -> Self {
        Self {
            document_id,
            positions,
        }
    }

    pub fn single(document_id: DocumentId, position: Position) -> Self {
        Self {
            document_id,
            positions: vec![position],
        }
    }

    /// Number of occurrences (the term frequency used for scoring)
    pub fn positions_count(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Append an occurrence, keeping positions ascending.
    ///
    /// Duplicates accumulate rather than being collapsed.
    pub fn push_position(&mut self, position: Position) {
        match self.positions.last() {
            Some(&last) if position < last => {
                let at = self.positions.partition_point(|&p| p <= position);
                self.positions.insert(at, position);
            }
            _ => self.positions.push(position),
        }
    }
}

/// Ordered postings for one token
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PostingsList {
    entries: Vec<PostingsEntry>,
}

impl PostingsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from foreign entries, rejecting any ordering violation
    pub fn from_entries(entries: Vec<PostingsEntry>) -> std::result::Result<Self, String> {
        check_entries(&entries)?;
        Ok(Self { entries })
    }

    /// Entries the caller has already proven to be strictly ascending
    pub(crate) fn from_sorted(entries: Vec<PostingsEntry>) -> Self {
        debug_assert!(check_entries(&entries).is_ok());
        Self { entries }
    }

    pub fn entries(&self) -> &[PostingsEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PostingsEntry> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PostingsEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_document(&self) -> Option<DocumentId> {
        self.entries.first().map(|e| e.document_id)
    }

    pub fn last_document(&self) -> Option<DocumentId> {
        self.entries.last().map(|e| e.document_id)
    }

    /// Look up the entry for a document
    pub fn get(&self, document_id: DocumentId) -> Option<&PostingsEntry> {
        self.entries
            .binary_search_by_key(&document_id, |e| e.document_id)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Number of distinct documents with at least one occurrence
    pub fn document_frequency(&self) -> u32 {
        self.entries
            .iter()
            .filter(|e| !e.positions.is_empty())
            .count() as u32
    }

    /// Record one occurrence of the token.
    ///
    /// Returns true when this created the first entry for `document_id`.
    pub fn record(&mut self, document_id: DocumentId, position: Position) -> bool {
        if let Some(last) = self.entries.last_mut() {
            if last.document_id == document_id {
                last.push_position(position);
                return false;
            }
            if last.document_id < document_id {
                self.entries.push(PostingsEntry::single(document_id, position));
                return true;
            }
        } else {
            self.entries.push(PostingsEntry::single(document_id, position));
            return true;
        }

        // Out-of-order document id (a title re-added within the same session)
        match self
            .entries
            .binary_search_by_key(&document_id, |e| e.document_id)
        {
            Ok(idx) => {
                self.entries[idx].push_position(position);
                false
            }
            Err(idx) => {
                self.entries
                    .insert(idx, PostingsEntry::single(document_id, position));
                true
            }
        }
    }

    /// Append entries that all sort after the current last document
    pub(crate) fn extend_sorted(&mut self, entries: Vec<PostingsEntry>) {
        debug_assert!(match (self.last_document(), entries.first()) {
            (Some(last), Some(first)) => last < first.document_id,
            _ => true,
        });
        self.entries.extend(entries);
    }
}

impl<'de> Deserialize<'de> for PostingsList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<PostingsEntry>::deserialize(deserializer)?;
        PostingsList::from_entries(entries).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingsEntry;
    type IntoIter = std::slice::Iter<'a, PostingsEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn check_entries(entries: &[PostingsEntry]) -> std::result::Result<(), String> {
    for pair in entries.windows(2) {
        if pair[0].document_id >= pair[1].document_id {
            return Err(format!(
                "document ids out of order: {} followed by {}",
                pair[0].document_id, pair[1].document_id
            ));
        }
    }
    for entry in entries {
        if entry.positions.windows(2).any(|p| p[0] > p[1]) {
            return Err(format!(
                "positions out of order in document {}",
                entry.document_id
            ));
        }
    }
    Ok(())
}
