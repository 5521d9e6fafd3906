use crate::models::{DocumentId, PostingsEntry, PostingsList};

/// Forward-only cursor over a postings list
#[derive(Clone, Debug)]
pub struct PostingsCursor<'a> {
    entries: &'a [PostingsEntry],
    pos: usize,
}

impl<'a> PostingsCursor<'a> {
    pub fn new(list: &'a PostingsList) -> Self {
        Self {
            entries: list.entries(),
            pos: 0,
        }
    }

    pub fn current(&self) -> Option<&'a PostingsEntry> {
        self.entries.get(self.pos)
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.current().map(|e| e.document_id)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.entries.len()
    }

    pub fn advance(&mut self) -> Option<DocumentId> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        self.document_id()
    }

    /// Move to the first entry with a document id `>= target`.
    ///
    /// Gallops forward from the current position, then binary searches the
    /// bracketed range. Never moves backwards.
    pub fn seek(&mut self, target: DocumentId) -> Option<DocumentId> {
        match self.document_id() {
            None => return None,
            Some(doc) if doc >= target => return Some(doc),
            Some(_) => {}
        }

        let len = self.entries.len();
        let mut lo = self.pos;
        let mut step = 1;
        let mut hi = lo + step;
        while hi < len && self.entries[hi].document_id < target {
            lo = hi;
            step *= 2;
            hi = lo + step;
        }
        let hi = hi.min(len);

        // entries[lo] < target, and entries[hi] >= target or hi == len
        let offset = self.entries[lo + 1..hi].partition_point(|e| e.document_id < target);
        self.pos = lo + 1 + offset;
        self.document_id()
    }
}
