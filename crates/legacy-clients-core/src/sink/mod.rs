//! Destinations for the normalized client stream.
//!
//! Every sink writes with insert-or-skip semantics keyed on
//! `legacy_client_id`, so replaying an export never fails on rows that are
//! already loaded.

mod postgres;
mod rest;
mod sql_text;

pub use postgres::PostgresSink;
pub use rest::RestSink;
pub use sql_text::{render_insert_block, render_value, SqlTarget, SqlTextSink};

use async_trait::async_trait;
use legacy_clients_parser::{target_columns, LegacyClientRecord, IDENTIFIER_TARGET};
use pg_escape::quote_identifier;
use serde::Serialize;

use crate::batch::Batch;
use crate::error::Result;
use crate::ingestion::ImportReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub written: usize,
    pub already_present: usize,
}

#[async_trait]
pub trait RecordSink: Send {
    fn name(&self) -> &'static str;

    /// Write one batch as a single operation.
    async fn write_batch(&mut self, batch: &Batch<LegacyClientRecord>) -> Result<BatchOutcome>;

    /// Called once after the last batch, with the final counters.
    async fn finish(&mut self, _report: &ImportReport) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn column_list() -> String {
    target_columns()
        .map(|column| quote_identifier(column).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn conflict_clause() -> String {
    format!(
        "ON CONFLICT ({}) DO NOTHING",
        quote_identifier(IDENTIFIER_TARGET)
    )
}
