use crate::config::{IndexSettings, TokenizerConfig};
use crate::models::Position;

/// CJK punctuation that never takes part in a token
const CJK_PUNCTUATION: [char; 10] = ['、', '。', '（', '）', '！', '，', '：', '；', '“', '”'];

/// Whitespace, ASCII punctuation, CJK punctuation and (unless enabled) ASCII
/// letters and digits are ignored; everything else is indexable.
fn is_ignored_char(c: char, index_ascii_alphanumeric: bool) -> bool {
    if c.is_ascii_alphanumeric() {
        return !index_ascii_alphanumeric;
    }
    c.is_ascii_whitespace() || c.is_ascii_punctuation() || CJK_PUNCTUATION.contains(&c)
}

/// One n-gram occurrence: its text and the character offset it starts at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub offset: Position,
}

/// Sliding-window n-gram tokenizer
#[derive(Clone, Debug)]
pub struct NgramTokenizer {
    n: usize,
    index_ascii_alphanumeric: bool,
}

impl NgramTokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(n: usize, config: &TokenizerConfig) -> Self {
        Self {
            n,
            index_ascii_alphanumeric: config.index_ascii_alphanumeric,
        }
    }

    pub fn from_settings(settings: &IndexSettings) -> Self {
        Self::new(settings.token_len, &settings.tokenizer)
    }

    pub fn token_len(&self) -> usize {
        self.n
    }

    /// Whether `c` is skipped rather than indexed
    pub fn is_ignored(&self, c: char) -> bool {
        is_ignored_char(c, self.index_ascii_alphanumeric)
    }

    /// Split `text` into overlapping n-grams.
    ///
    /// The returned iterator is lazy and can be cloned to restart the scan.
    pub fn segment<'a>(&self, text: &'a str) -> Ngrams<'a> {
        Ngrams {
            text,
            n: self.n,
            index_ascii_alphanumeric: self.index_ascii_alphanumeric,
            byte_pos: 0,
            char_pos: 0,
        }
    }

    /// Length of `text` in characters, the unit query lengths are checked in
    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }
}

/// Segment `text` into n-grams using the default character classification
pub fn segment(text: &str, n: usize) -> Ngrams<'_> {
    NgramTokenizer::new(n, &TokenizerConfig::default()).segment(text)
}

/// Lazy n-gram scan over one text
#[derive(Clone, Debug)]
pub struct Ngrams<'a> {
    text: &'a str,
    n: usize,
    index_ascii_alphanumeric: bool,
    byte_pos: usize,
    char_pos: Position,
}

impl<'a> Ngrams<'a> {
    fn is_ignored(&self, c: char) -> bool {
        is_ignored_char(c, self.index_ascii_alphanumeric)
    }
}

impl<'a> Iterator for Ngrams<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.n == 0 {
            return None;
        }

        loop {
            let rest = &self.text[self.byte_pos..];

            let mut skipped_bytes = 0;
            let mut skipped_chars = 0;
            for c in rest.chars() {
                if !self.is_ignored(c) {
                    break;
                }
                skipped_bytes += c.len_utf8();
                skipped_chars += 1;
            }
            self.byte_pos += skipped_bytes;
            self.char_pos += skipped_chars;

            let window = &self.text[self.byte_pos..];
            let mut chars = window.chars();
            let first = chars.next()?;

            let mut count = 1;
            let mut end = first.len_utf8();
            for c in chars {
                if count == self.n || self.is_ignored(c) {
                    break;
                }
                count += 1;
                end += c.len_utf8();
            }

            if count == self.n {
                let token = Token {
                    text: &window[..end],
                    offset: self.char_pos,
                };
                self.byte_pos += first.len_utf8();
                self.char_pos += 1;
                return Some(token);
            }

            // Short window: discard it and resume at the character that cut it off
            self.byte_pos += end;
            self.char_pos += count as Position;
        }
    }
}
