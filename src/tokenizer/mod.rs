//! N-gram tokenization

#[allow(clippy::module_inception)]
mod tokenizer;

pub use tokenizer::{segment, NgramTokenizer, Ngrams, Token};
