//! JSONL dataset reader.
//!
//! This module opens the input file and yields one [`Record`] per
//! non-blank line, lazily, so the raw input is never held in memory.

use crate::models::{FieldError, Record};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading the dataset. All of them abort the run.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line} is not a valid JSON object: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: {source}")]
    InvalidField {
        line: usize,
        #[source]
        source: FieldError,
    },
}

impl DatasetError {
    /// The 1-based input line the error refers to, if any.
    #[allow(dead_code)] // Utility for error reporting
    pub fn line(&self) -> Option<usize> {
        match self {
            DatasetError::Open { .. } => None,
            DatasetError::Read { line, .. }
            | DatasetError::Decode { line, .. }
            | DatasetError::InvalidField { line, .. } => Some(*line),
        }
    }
}

/// Open a dataset file for reading.
pub fn open(path: &Path) -> Result<RecordReader<BufReader<File>>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Opened dataset: {}", path.display());
    Ok(RecordReader::new(BufReader::new(file)))
}

/// Iterator over the records of a JSONL stream.
///
/// Blank and whitespace-only lines are skipped. Each other line must
/// decode as a JSON object.
pub struct RecordReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Number of physical lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> usize {
        self.line
    }

    fn decode(&self, text: &str) -> Result<Record, DatasetError> {
        let line = self.line;
        let obj: Map<String, Value> =
            serde_json::from_str(text).map_err(|source| DatasetError::Decode { line, source })?;
        Record::from_object(obj).map_err(|source| DatasetError::InvalidField { line, source })
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = self.lines.next()?;
            self.line += 1;

            let text = match text {
                Ok(text) => text,
                Err(source) => {
                    return Some(Err(DatasetError::Read {
                        line: self.line,
                        source,
                    }))
                }
            };

            if text.trim().is_empty() {
                continue;
            }

            return Some(self.decode(&text));
        }
    }
}
