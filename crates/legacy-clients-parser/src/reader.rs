use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::errors::{ParserError, RejectReason, RowRejection};
use crate::model::LegacyClientRecord;
use crate::normalize::{normalize_row, FlagTokens, RawRow};
use crate::schema::{CLIENT_COLUMNS, IDENTIFIER_COLUMN};

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub flags: FlagTokens,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            flags: FlagTokens::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Record(LegacyClientRecord),
    Rejected(RowRejection),
}

/// A data row addressed through the file's header.
pub struct HeaderedRow<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl RawRow for HeaderedRow<'_> {
    fn get(&self, column: &str) -> Option<&str> {
        self.index
            .get(column)
            .and_then(|position| self.record.get(*position))
    }
}

/// Streams normalized client rows out of one delimited export.
pub struct ClientCsvReader<R: Read> {
    source_name: String,
    reader: csv::Reader<R>,
    header_index: HashMap<String, usize>,
    flags: FlagTokens,
    buffer: StringRecord,
    finished: bool,
}

impl ClientCsvReader<File> {
    pub fn from_path(path: &Path, options: &ReaderOptions) -> Result<Self, ParserError> {
        let file = File::open(path).map_err(|source| ParserError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path.display().to_string(), file, options)
    }
}

impl<R: Read> ClientCsvReader<R> {
    pub fn from_reader(
        source_name: impl Into<String>,
        input: R,
        options: &ReaderOptions,
    ) -> Result<Self, ParserError> {
        let source_name = source_name.into();
        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|source| ParserError::Csv {
                source_name: source_name.clone(),
                source,
            })?
            .clone();

        let mut header_index = HashMap::with_capacity(headers.len());
        for (position, name) in headers.iter().enumerate() {
            let name = name.trim_start_matches('\u{feff}').trim();
            header_index.entry(name.to_string()).or_insert(position);
        }

        if !header_index.contains_key(IDENTIFIER_COLUMN) {
            return Err(ParserError::InvalidHeader {
                source_name,
                message: format!("required column '{IDENTIFIER_COLUMN}' not found"),
            });
        }

        let missing: Vec<&str> = CLIENT_COLUMNS
            .iter()
            .map(|spec| spec.source)
            .filter(|name| !header_index.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            warn!(
                source = %source_name,
                missing = ?missing,
                "Export header lacks known columns; they will be loaded as NULL"
            );
        }

        Ok(Self {
            source_name,
            reader,
            header_index,
            flags: options.flags.clone(),
            buffer: StringRecord::new(),
            finished: false,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn rejection(&self, line: u64, reason: RejectReason) -> RowRejection {
        RowRejection {
            source: self.source_name.clone(),
            line,
            reason,
        }
    }
}

impl<R: Read> Iterator for ClientCsvReader<R> {
    type Item = Result<RowOutcome, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.buffer) {
            Ok(false) => {
                self.finished = true;
                None
            }
            Ok(true) => {
                let line = self.buffer.position().map(|p| p.line()).unwrap_or(0);
                let row = HeaderedRow {
                    index: &self.header_index,
                    record: &self.buffer,
                };
                let outcome = match normalize_row(&row, &self.flags) {
                    Ok(record) => {
                        debug!(line, legacy_client_id = record.legacy_client_id, "Normalized row");
                        RowOutcome::Record(record)
                    }
                    Err(reason) => RowOutcome::Rejected(self.rejection(line, reason)),
                };
                Some(Ok(outcome))
            }
            Err(err) if err.is_io_error() => {
                self.finished = true;
                Some(Err(ParserError::Csv {
                    source_name: self.source_name.clone(),
                    source: err,
                }))
            }
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                let reason = RejectReason::Malformed(err.to_string());
                Some(Ok(RowOutcome::Rejected(self.rejection(line, reason))))
            }
        }
    }
}

/// Expand an input argument into the files to read, in order.
///
/// Plain paths are returned as-is so a missing file surfaces when it is
/// opened; glob patterns must match at least one file.
pub fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>, ParserError> {
    if !input.contains(&['*', '?', '['][..]) {
        return Ok(vec![PathBuf::from(input)]);
    }

    let entries = glob::glob(input).map_err(|err| ParserError::InvalidPattern {
        pattern: input.to_string(),
        message: err.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "Could not read path from input pattern"),
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(ParserError::NoInputFiles {
            pattern: input.to_string(),
        });
    }
    Ok(paths)
}

/// Chains several exports into one row stream, opening each file lazily.
pub struct ClientInputs {
    pending: VecDeque<PathBuf>,
    current: Option<ClientCsvReader<File>>,
    options: ReaderOptions,
}

impl ClientInputs {
    pub fn new(paths: Vec<PathBuf>, options: ReaderOptions) -> Self {
        Self {
            pending: paths.into(),
            current: None,
            options,
        }
    }

    pub fn open(input: &str, options: ReaderOptions) -> Result<Self, ParserError> {
        Ok(Self::new(resolve_inputs(input)?, options))
    }
}

impl Iterator for ClientInputs {
    type Item = Result<RowOutcome, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }

            let path = self.pending.pop_front()?;
            match ClientCsvReader::from_path(&path, &self.options) {
                Ok(reader) => {
                    debug!(source = reader.source_name(), "Opened client export");
                    self.current = Some(reader);
                }
                Err(err) => {
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}
