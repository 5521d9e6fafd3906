use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::error::{GramdexError, Result};
use crate::models::RawDocument;

/// Producer of `(title, body)` records
pub trait DocumentSource: Iterator<Item = Result<RawDocument>> {}

impl<I> DocumentSource for I where I: Iterator<Item = Result<RawDocument>> {}

/// Reads one JSON object per line: `{"title": "...", "body": "..."}`.
///
/// Blank lines are skipped.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|e| {
                GramdexError::invalid_input(format!("line {}: {}", self.line_no, e))
            }));
        }
    }
}
