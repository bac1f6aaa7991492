use anyhow::Result;
use async_trait::async_trait;
use legacy_clients_core::batch::Batch;
use legacy_clients_core::dedup::DedupFilter;
use legacy_clients_core::ingestion::{run_import, ImportReport};
use legacy_clients_core::sink::{BatchOutcome, RecordSink};
use legacy_clients_core::LoaderError;
use legacy_clients_parser::{ClientInputs, LegacyClientRecord, ParserError, ReaderOptions, RowOutcome};

fn fixture(name: &str) -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../legacy-clients-parser/tests/data")
        .join(name)
        .display()
        .to_string()
}

fn open_fixture(name: &str) -> ClientInputs {
    ClientInputs::open(&fixture(name), ReaderOptions::default()).expect("open fixture")
}

#[derive(Default)]
struct RecordingSink {
    batches: Vec<Vec<i64>>,
    finished_with: Option<ImportReport>,
    fail_sequences: Vec<usize>,
}

#[async_trait]
impl RecordSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn write_batch(
        &mut self,
        batch: &Batch<LegacyClientRecord>,
    ) -> legacy_clients_core::Result<BatchOutcome> {
        if self.fail_sequences.contains(&batch.sequence) {
            return Err(LoaderError::Sink {
                sink: "recording",
                message: format!("refusing batch {}", batch.sequence),
            });
        }
        self.batches
            .push(batch.items.iter().map(|r| r.legacy_client_id).collect());
        Ok(BatchOutcome {
            written: batch.len(),
            already_present: 0,
        })
    }

    async fn finish(&mut self, report: &ImportReport) -> legacy_clients_core::Result<()> {
        self.finished_with = Some(report.clone());
        Ok(())
    }
}

#[tokio::test]
async fn fixture_import_preserves_order_and_counts_skips() -> Result<()> {
    let mut sink = RecordingSink::default();
    let mut filter = DedupFilter::default();

    let report = run_import(open_fixture("clients.csv"), &mut filter, 3, &mut sink).await?;

    assert_eq!(sink.batches, vec![vec![1781, 1742, 1860], vec![1567]]);
    assert_eq!(report.rows_read, 6);
    assert_eq!(report.skipped_missing_id, 2);
    assert_eq!(report.row_errors, 0);
    assert_eq!(report.batches_written, 2);
    assert_eq!(report.records_written, 4);
    assert_eq!(report.total_processed(), 4);
    assert_eq!(sink.finished_with.as_ref(), Some(&report));
    Ok(())
}

#[tokio::test]
async fn failed_batch_does_not_stop_later_batches() -> Result<()> {
    let mut sink = RecordingSink {
        fail_sequences: vec![2],
        ..Default::default()
    };
    let mut filter = DedupFilter::default();

    let report = run_import(open_fixture("clients.csv"), &mut filter, 1, &mut sink).await?;

    assert_eq!(sink.batches, vec![vec![1781], vec![1860], vec![1567]]);
    assert_eq!(report.batches_written, 3);
    assert_eq!(report.batches_failed, 1);
    assert_eq!(report.records_failed, 1);
    assert_eq!(report.records_written, 3);
    assert!(report.has_failures());
    Ok(())
}

#[tokio::test]
async fn known_and_repeated_ids_are_filtered() -> Result<()> {
    let mut sink = RecordingSink::default();
    let mut filter = DedupFilter::new([1742, 1567].into_iter().collect());

    let mut rows: Vec<_> = open_fixture("clients.csv").collect();
    rows.extend(open_fixture("clients.csv"));

    let report = run_import(rows, &mut filter, 100, &mut sink).await?;

    assert_eq!(sink.batches, vec![vec![1781, 1860]]);
    assert_eq!(report.rows_read, 12);
    assert_eq!(report.excluded, 4);
    assert_eq!(report.duplicates_in_input, 2);
    assert_eq!(report.skipped_missing_id, 4);
    Ok(())
}

#[tokio::test]
async fn malformed_rows_are_counted_as_row_errors() -> Result<()> {
    let mut sink = RecordingSink::default();
    let mut filter = DedupFilter::default();

    let report = run_import(open_fixture("ragged.csv"), &mut filter, 10, &mut sink).await?;

    assert_eq!(sink.batches, vec![vec![20, 22]]);
    assert_eq!(report.row_errors, 1);
    assert_eq!(report.rows_read, 3);
    Ok(())
}

#[tokio::test]
async fn missing_input_aborts_the_run() {
    let mut sink = RecordingSink::default();
    let mut filter = DedupFilter::default();
    let rows = ClientInputs::new(
        vec![fixture("does_not_exist.csv").into()],
        ReaderOptions::default(),
    );

    let err = run_import(rows, &mut filter, 10, &mut sink)
        .await
        .expect_err("missing file is fatal");
    assert!(matches!(err, LoaderError::Parser(_)));
    assert!(sink.finished_with.is_none());
}

#[tokio::test]
async fn zero_batch_size_is_rejected() {
    let mut sink = RecordingSink::default();
    let mut filter = DedupFilter::default();
    let err = run_import(Vec::<std::result::Result<RowOutcome, ParserError>>::new(), &mut filter, 0, &mut sink)
        .await
        .expect_err("zero batch size");
    assert!(matches!(err, LoaderError::Config(_)));
}
