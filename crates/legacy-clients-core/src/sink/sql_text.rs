use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use legacy_clients_parser::{target_columns, FieldValue, LegacyClientRecord};
use pg_escape::{quote_identifier, quote_literal};
use tracing::info;

use super::{conflict_clause, BatchOutcome, RecordSink};
use crate::batch::Batch;
use crate::config::DestinationConfig;
use crate::error::Result;
use crate::ingestion::ImportReport;

const COLUMNS_PER_LINE: usize = 6;

/// Where generated statements go.
pub enum SqlTarget {
    /// One script holding every batch, optionally wrapped in a transaction.
    Writer(Box<dyn Write + Send>),
    /// One self-contained file per batch: `batch_001.sql`, `batch_002.sql`, ...
    Directory(PathBuf),
}

impl SqlTarget {
    pub fn file(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(SqlTarget::Writer(Box::new(BufWriter::new(File::create(
            path,
        )?))))
    }

    pub fn stdout() -> Self {
        SqlTarget::Writer(Box::new(std::io::stdout()))
    }
}

pub struct SqlTextSink {
    target: SqlTarget,
    table: String,
    source_label: String,
    wrap_transaction: bool,
    preamble_written: bool,
    files: Vec<PathBuf>,
}

impl SqlTextSink {
    pub fn new(
        target: SqlTarget,
        destination: &DestinationConfig,
        source_label: impl Into<String>,
        wrap_transaction: bool,
    ) -> Result<Self> {
        if let SqlTarget::Directory(dir) = &target {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            target,
            table: destination.qualified_name(),
            source_label: source_label.into(),
            wrap_transaction,
            preamble_written: false,
            files: Vec::new(),
        })
    }

    /// Batch files written so far in directory mode.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn header_comment(&self) -> String {
        format!(
            "-- Legacy clients import\n-- Source: {}\n-- Generated: {}\n",
            self.source_label.replace('\n', " "),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    fn write_preamble(&mut self) -> Result<()> {
        if self.preamble_written {
            return Ok(());
        }
        let mut preamble = self.header_comment();
        if self.wrap_transaction {
            preamble.push_str("BEGIN;\n");
        }
        preamble.push('\n');

        if let SqlTarget::Writer(writer) = &mut self.target {
            writer.write_all(preamble.as_bytes())?;
        }
        self.preamble_written = true;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for SqlTextSink {
    fn name(&self) -> &'static str {
        "sql-text"
    }

    async fn write_batch(&mut self, batch: &Batch<LegacyClientRecord>) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let block = render_insert_block(&self.table, &batch.items);

        if let SqlTarget::Directory(dir) = &self.target {
            let path = dir.join(format!("batch_{:03}.sql", batch.sequence));
            let contents = format!(
                "{}-- Batch {} ({} records)\n{}",
                self.header_comment(),
                batch.sequence,
                batch.len(),
                block
            );
            fs::write(&path, contents)?;
            self.files.push(path);
        } else {
            self.write_preamble()?;
            if let SqlTarget::Writer(writer) = &mut self.target {
                writeln!(writer, "-- Batch {} ({} records)", batch.sequence, batch.len())?;
                writer.write_all(block.as_bytes())?;
                writer.write_all(b"\n")?;
            }
        }

        Ok(BatchOutcome {
            written: batch.len(),
            already_present: 0,
        })
    }

    async fn finish(&mut self, report: &ImportReport) -> Result<()> {
        if let SqlTarget::Directory(dir) = &self.target {
            info!(
                directory = %dir.display(),
                files = self.files.len(),
                "Wrote batch files"
            );
            return Ok(());
        }

        self.write_preamble()?;
        let mut trailer = String::new();
        if self.wrap_transaction {
            trailer.push_str("COMMIT;\n\n");
        }
        let _ = writeln!(trailer, "-- Import summary:");
        let _ = writeln!(trailer, "-- Rows read: {}", report.rows_read);
        let _ = writeln!(trailer, "-- Records emitted: {}", report.records_written);
        let _ = writeln!(trailer, "-- Skipped (missing id): {}", report.skipped_missing_id);
        let _ = writeln!(trailer, "-- Excluded (known id): {}", report.excluded);
        let _ = writeln!(trailer, "-- Duplicates in input: {}", report.duplicates_in_input);
        let _ = writeln!(trailer, "-- Row errors: {}", report.row_errors);

        if let SqlTarget::Writer(writer) = &mut self.target {
            writer.write_all(trailer.as_bytes())?;
            writer.flush()?;
        }
        Ok(())
    }
}

/// Render one value as a Postgres literal.
pub fn render_value(value: FieldValue<'_>) -> String {
    match value {
        FieldValue::Integer(Some(number)) => number.to_string(),
        FieldValue::Text(Some(text)) => quote_literal(text).to_string(),
        FieldValue::Flag(Some(true)) => "true".to_string(),
        FieldValue::Flag(Some(false)) => "false".to_string(),
        FieldValue::Integer(None) | FieldValue::Text(None) | FieldValue::Flag(None) => {
            "NULL".to_string()
        }
    }
}

/// One self-contained insert statement carrying the full column list.
pub fn render_insert_block(table: &str, records: &[LegacyClientRecord]) -> String {
    let mut sql = String::new();
    let _ = writeln!(sql, "INSERT INTO {table} (");

    let columns: Vec<String> = target_columns()
        .map(|column| quote_identifier(column).to_string())
        .collect();
    let lines: Vec<String> = columns
        .chunks(COLUMNS_PER_LINE)
        .map(|chunk| format!("    {}", chunk.join(", ")))
        .collect();
    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n) VALUES\n");

    let tuples: Vec<String> = records
        .iter()
        .map(|record| {
            let values: Vec<String> = record
                .values()
                .map(|(_, value)| render_value(value))
                .collect();
            format!("    ({})", values.join(", "))
        })
        .collect();
    sql.push_str(&tuples.join(",\n"));
    sql.push('\n');
    sql.push_str(&conflict_clause());
    sql.push_str(";\n");
    sql
}
