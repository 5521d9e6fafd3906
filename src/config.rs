use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{GramdexError, Result};

/// N-gram size used when nothing else is configured (bigrams)
pub const DEFAULT_TOKEN_LEN: usize = 2;

/// Distinct buffered token ids tolerated before the buffer is flushed
pub const DEFAULT_BUFFER_UPDATE_THRESHOLD: usize = 2048;

/// Document cap applied by the CLI when ingesting a dump
pub const DEFAULT_MAX_DOCUMENTS: usize = 10;

/// Compression applied to postings blobs written by a session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Direct structural serialization of the entry sequence
    #[default]
    None,
    /// Document ids and positions stored as gaps, variable-byte packed
    Delta,
}

impl FromStr for CompressionMode {
    type Err = GramdexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionMode::None),
            "delta" | "delta-coded" => Ok(CompressionMode::Delta),
            other => Err(GramdexError::invalid_input(format!(
                "unknown compression mode '{}', expected 'none' or 'delta'",
                other
            ))),
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMode::None => write!(f, "none"),
            CompressionMode::Delta => write!(f, "delta"),
        }
    }
}

/// Tokenizer configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Treat ASCII letters and digits as indexable characters.
    ///
    /// Off by default: the classic classification ignores them so that only
    /// ideographic text is split into n-grams.
    pub index_ascii_alphanumeric: bool,
}

/// Index settings configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// N in N-gram
    pub token_len: usize,
    pub compression: CompressionMode,
    /// Flush once the buffer holds more distinct token ids than this
    pub buffer_update_threshold: usize,
    pub tokenizer: TokenizerConfig,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            token_len: DEFAULT_TOKEN_LEN,
            compression: CompressionMode::None,
            buffer_update_threshold: DEFAULT_BUFFER_UPDATE_THRESHOLD,
            tokenizer: TokenizerConfig::default(),
        }
    }
}

impl IndexSettings {
    /// Load settings from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let settings: IndexSettings = serde_json::from_str(&data).map_err(|e| {
            GramdexError::invalid_input(format!("parsing settings file {:?}: {}", path, e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_len == 0 {
            return Err(GramdexError::invalid_input("token_len must be at least 1"));
        }
        if self.buffer_update_threshold == 0 {
            return Err(GramdexError::invalid_input(
                "buffer_update_threshold must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn with_token_len(mut self, token_len: usize) -> Self {
        self.token_len = token_len;
        self
    }

    pub fn with_compression(mut self, compression: CompressionMode) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_buffer_update_threshold(mut self, threshold: usize) -> Self {
        self.buffer_update_threshold = threshold;
        self
    }

    pub fn with_ascii_indexing(mut self, enabled: bool) -> Self {
        self.tokenizer.index_ascii_alphanumeric = enabled;
        self
    }
}

/// Engine configuration: where the store lives and how sessions index
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub settings: IndexSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            settings: IndexSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    pub fn with_settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Directory holding the key-value store
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}
