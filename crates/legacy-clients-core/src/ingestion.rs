use legacy_clients_parser::{LegacyClientRecord, ParserError, RejectReason, RowOutcome};
use serde::Serialize;
use tracing::{info, warn};

use crate::batch::{Batch, BatchAccumulator};
use crate::dedup::{Decision, DedupFilter};
use crate::error::Result;
use crate::sink::RecordSink;

/// Counters for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Data rows seen, including rejected ones.
    pub rows_read: usize,
    pub skipped_missing_id: usize,
    pub row_errors: usize,
    pub excluded: usize,
    pub duplicates_in_input: usize,
    pub batches_written: usize,
    pub batches_failed: usize,
    pub records_written: usize,
    pub records_already_present: usize,
    pub records_failed: usize,
}

impl ImportReport {
    /// Records handed to the sink, whatever the outcome.
    pub fn total_processed(&self) -> usize {
        self.records_written + self.records_already_present + self.records_failed
    }

    pub fn has_failures(&self) -> bool {
        self.batches_failed > 0
    }
}

/// Stream rows through the filter and into the sink, one batch at a time.
///
/// Row-level rejections are counted and skipped. A batch the sink refuses is
/// logged and counted as failed, and the run continues with the next one.
/// Only input-level errors (unreadable file, bad header) abort the run.
pub async fn run_import<I, S>(
    rows: I,
    filter: &mut DedupFilter,
    batch_size: usize,
    sink: &mut S,
) -> Result<ImportReport>
where
    I: IntoIterator<Item = std::result::Result<RowOutcome, ParserError>>,
    S: RecordSink + ?Sized,
{
    let mut report = ImportReport::default();
    let mut accumulator = BatchAccumulator::new(batch_size)?;

    for row in rows {
        let record = match row? {
            RowOutcome::Record(record) => record,
            RowOutcome::Rejected(rejection) => {
                report.rows_read += 1;
                match rejection.reason {
                    RejectReason::MissingIdentifier => report.skipped_missing_id += 1,
                    RejectReason::Malformed(_) => report.row_errors += 1,
                }
                warn!(
                    source = %rejection.source,
                    line = rejection.line,
                    reason = %rejection.reason,
                    "Skipping row"
                );
                continue;
            }
        };
        report.rows_read += 1;

        match filter.decide(record.legacy_client_id) {
            Decision::Accept => {}
            Decision::Excluded => {
                report.excluded += 1;
                continue;
            }
            Decision::Duplicate => {
                report.duplicates_in_input += 1;
                warn!(
                    legacy_client_id = record.legacy_client_id,
                    "Client id repeated in input; keeping the first occurrence"
                );
                continue;
            }
        }

        if let Some(batch) = accumulator.push(record) {
            write_one(sink, &batch, &mut report).await;
        }
    }

    if let Some(batch) = accumulator.finish() {
        write_one(sink, &batch, &mut report).await;
    }

    info!(
        sink = sink.name(),
        rows_read = report.rows_read,
        written = report.records_written,
        already_present = report.records_already_present,
        failed = report.records_failed,
        skipped_missing_id = report.skipped_missing_id,
        excluded = report.excluded,
        "Import finished"
    );

    sink.finish(&report).await?;
    Ok(report)
}

async fn write_one<S>(sink: &mut S, batch: &Batch<LegacyClientRecord>, report: &mut ImportReport)
where
    S: RecordSink + ?Sized,
{
    match sink.write_batch(batch).await {
        Ok(outcome) => {
            report.batches_written += 1;
            report.records_written += outcome.written;
            report.records_already_present += outcome.already_present;
            info!(
                sink = sink.name(),
                batch = batch.sequence,
                records = batch.len(),
                written = outcome.written,
                already_present = outcome.already_present,
                "Batch written"
            );
        }
        Err(err) => {
            report.batches_failed += 1;
            report.records_failed += batch.len();
            let first = batch.items.first().map(|r| r.legacy_client_id);
            let last = batch.items.last().map(|r| r.legacy_client_id);
            warn!(
                sink = sink.name(),
                batch = batch.sequence,
                records = batch.len(),
                first_id = ?first,
                last_id = ?last,
                error = %err,
                "Batch failed"
            );
        }
    }
}
