use serde::{Deserialize, Serialize};

use super::document::DocumentId;

/// Placeholder shown when a result's title cannot be resolved
pub const UNKNOWN_TITLE: &str = "<unknown title>";

/// Ranked match with its accumulated score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: DocumentId,
    pub score: f64,
}

impl SearchResult {
    pub fn new(document_id: DocumentId, score: f64) -> Self {
        Self { document_id, score }
    }
}

/// A search result resolved for presentation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: DocumentId,
    pub score: f64,
    pub title: Option<String>,
    /// Why the title lookup failed, if it did
    pub lookup_error: Option<String>,
}

impl SearchHit {
    pub fn resolved(result: &SearchResult, title: String) -> Self {
        Self {
            document_id: result.document_id,
            score: result.score,
            title: Some(title),
            lookup_error: None,
        }
    }

    pub fn degraded(result: &SearchResult, error: String) -> Self {
        Self {
            document_id: result.document_id,
            score: result.score,
            title: None,
            lookup_error: Some(error),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_display_title() {
        let result = SearchResult::new(7, 3.0);
        let hit = SearchHit::resolved(&result, "東京".to_string());
        assert_eq!(hit.display_title(), "東京");

        let hit = SearchHit::degraded(&result, "Not found: document 7".to_string());
        assert_eq!(hit.display_title(), UNKNOWN_TITLE);
        assert_eq!(hit.score, 3.0);
    }
}
