use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a data row did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingIdentifier,
    Malformed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingIdentifier => write!(f, "missing client identifier"),
            RejectReason::Malformed(message) => write!(f, "malformed row: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub source: String,
    pub line: u64,
    pub reason: RejectReason,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source, self.line, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{source_name} header invalid: {message}")]
    InvalidHeader {
        source_name: String,
        message: String,
    },

    #[error("{source_name} CSV error: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to open input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input pattern '{pattern}' is invalid: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("no input files matched '{pattern}'")]
    NoInputFiles { pattern: String },
}
