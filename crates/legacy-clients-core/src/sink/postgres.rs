use async_trait::async_trait;
use legacy_clients_parser::{FieldValue, LegacyClientRecord};
use sqlx::{Postgres, QueryBuilder};

use super::{column_list, conflict_clause, BatchOutcome, RecordSink};
use crate::batch::Batch;
use crate::config::DestinationConfig;
use crate::db::DbPool;
use crate::error::Result;

/// Writes each batch as one multi-row `INSERT ... ON CONFLICT DO NOTHING`.
pub struct PostgresSink {
    pool: DbPool,
    table: String,
}

impl PostgresSink {
    pub fn new(pool: DbPool, destination: &DestinationConfig) -> Self {
        Self {
            pool,
            table: destination.qualified_name(),
        }
    }
}

pub(crate) fn build_insert<'a>(
    table: &str,
    records: &'a [LegacyClientRecord],
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO {table} ({}) ", column_list()));

    builder.push_values(records, |mut row, record| {
        for (_, value) in record.values() {
            match value {
                FieldValue::Integer(value) => {
                    row.push_bind(value);
                }
                FieldValue::Text(value) => {
                    row.push_bind(value);
                }
                FieldValue::Flag(value) => {
                    row.push_bind(value);
                }
            }
        }
    });

    builder.push(" ");
    builder.push(conflict_clause());
    builder
}

#[async_trait]
impl RecordSink for PostgresSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn write_batch(&mut self, batch: &Batch<LegacyClientRecord>) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let mut builder = build_insert(&self.table, &batch.items);
        let result = builder.build().execute(&self.pool).await?;

        let written = usize::try_from(result.rows_affected()).unwrap_or(batch.len());
        Ok(BatchOutcome {
            written,
            already_present: batch.len().saturating_sub(written),
        })
    }
}
