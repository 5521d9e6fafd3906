pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod models;
pub mod persistence;
pub mod search;
pub mod tokenizer;

pub use config::{CompressionMode, EngineConfig, IndexSettings, TokenizerConfig};
pub use engine::Gramdex;
pub use error::{GramdexError, Result};
pub use index::{IndexSession, SessionState, SessionStats};
pub use ingest::{ingest, DocumentSource, IngestReport, JsonLinesSource};
pub use models::*;
pub use persistence::{FjallStore, MemoryStore, PostingsRecord, Store};
pub use search::Searcher;
pub use tokenizer::{segment, NgramTokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
