use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use legacy_clients_core::ingestion::ImportReport;
use legacy_clients_parser::LegacyClientRecord;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub sink: &'static str,
    #[serde(flatten)]
    pub report: ImportReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_rows_before: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_rows_after: Option<i64>,
}

impl ImportSummary {
    pub fn new(sink: &'static str, report: ImportReport) -> Self {
        Self {
            sink,
            report,
            destination_rows_before: None,
            destination_rows_after: None,
        }
    }

    pub fn with_row_counts(mut self, before: i64, after: i64) -> Self {
        self.destination_rows_before = Some(before);
        self.destination_rows_after = Some(after);
        self
    }

    pub fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else {
            let counts = self.destination_rows_before.zip(self.destination_rows_after);
            println!("{}", report_table(&self.report, counts));
        }
        Ok(())
    }
}

pub fn report_table(report: &ImportReport, row_counts: Option<(i64, i64)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Count"]);

    let rows = [
        ("Rows read", report.rows_read),
        ("Skipped (missing id)", report.skipped_missing_id),
        ("Row errors", report.row_errors),
        ("Excluded (known id)", report.excluded),
        ("Duplicates in input", report.duplicates_in_input),
        ("Batches written", report.batches_written),
        ("Batches failed", report.batches_failed),
        ("Records written", report.records_written),
        ("Records already present", report.records_already_present),
        ("Records failed", report.records_failed),
        ("Total processed", report.total_processed()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value.to_string()]);
    }

    if let Some((before, after)) = row_counts {
        table.add_row(vec!["Destination rows before".to_string(), before.to_string()]);
        table.add_row(vec!["Destination rows after".to_string(), after.to_string()]);
    }
    table
}

pub fn preview_table(records: &[LegacyClientRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["id", "descricao", "cidade", "uf", "ativo", "fields"]);

    for record in records {
        let populated = record.values().filter(|(_, value)| !value.is_absent()).count();
        table.add_row(vec![
            record.legacy_client_id.to_string(),
            record.descricao.clone().unwrap_or_default(),
            record.cidade.clone().unwrap_or_default(),
            record.uf.clone().unwrap_or_default(),
            record.ativo.map(|flag| flag.to_string()).unwrap_or_default(),
            populated.to_string(),
        ]);
    }
    table
}
