use thiserror::Error;

/// Main error type for gramdex operations
#[derive(Error, Debug)]
pub enum GramdexError {
    /// A token or document is absent. During search this is a normal
    /// control-flow signal; during indexing it is a genuine failure.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Postings codec error: {0}")]
    Codec(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type alias for gramdex operations
pub type Result<T> = std::result::Result<T, GramdexError>;

impl GramdexError {
    pub fn not_found(what: impl Into<String>) -> Self {
        GramdexError::NotFound(what.into())
    }

    pub fn codec(reason: impl Into<String>) -> Self {
        GramdexError::Codec(reason.into())
    }

    pub fn store(reason: impl Into<String>) -> Self {
        GramdexError::Store(reason.into())
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        GramdexError::InvalidInput(reason.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GramdexError::NotFound(_))
    }

    /// Check if this error indicates a transient failure that could be retried
    ///
    /// Store and IO failures may succeed on retry. A corrupted postings blob or
    /// bad input never will.
    pub fn is_retriable(&self) -> bool {
        matches!(self, GramdexError::Store(_) | GramdexError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GramdexError::not_found("token '日本'");
        assert_eq!(err.to_string(), "Not found: token '日本'");

        let err = GramdexError::codec("checksum mismatch");
        assert_eq!(err.to_string(), "Postings codec error: checksum mismatch");
    }

    #[test]
    fn test_error_classification() {
        assert!(GramdexError::not_found("x").is_not_found());
        assert!(!GramdexError::store("down").is_not_found());

        assert!(GramdexError::store("connection reset").is_retriable());
        assert!(!GramdexError::codec("bad tag").is_retriable());
        assert!(!GramdexError::invalid_input("empty title").is_retriable());
    }
}
