use async_trait::async_trait;
use legacy_clients_parser::{LegacyClientRecord, IDENTIFIER_TARGET};
use reqwest::header::{AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, Request};
use tracing::debug;

use super::{BatchOutcome, RecordSink};
use crate::batch::Batch;
use crate::config::{DestinationConfig, RestConfig, ENV_REST_KEY, ENV_REST_URL};
use crate::error::{LoaderError, Result};

const PREFER_IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates,return=representation";

/// Posts batches to a PostgREST endpoint (`/rest/v1/<table>`), asking the
/// server to skip rows whose `legacy_client_id` already exists.
pub struct RestSink {
    client: Client,
    table_url: String,
    endpoint: String,
    api_key: String,
    schema: String,
}

impl RestSink {
    pub fn new(rest: &RestConfig, destination: &DestinationConfig) -> Result<Self> {
        let url = rest
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| LoaderError::Config(format!("{ENV_REST_URL} must be set")))?;
        let api_key = rest
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LoaderError::Config(format!("{ENV_REST_KEY} must be set")))?;

        let table_url = format!(
            "{}/rest/v1/{}",
            url.trim().trim_end_matches('/'),
            destination.table
        );
        Ok(Self {
            client: Client::new(),
            endpoint: format!("{table_url}?on_conflict={IDENTIFIER_TARGET}"),
            table_url,
            api_key: api_key.trim().to_string(),
            schema: destination.schema.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_request(&self, records: &[LegacyClientRecord]) -> Result<Request> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", PREFER_IGNORE_DUPLICATES)
            .json(records);
        if self.schema != "public" {
            builder = builder.header("Content-Profile", &self.schema);
        }
        Ok(builder.build()?)
    }

    pub fn build_count_request(&self) -> Result<Request> {
        let mut builder = self
            .client
            .head(format!("{}?select={IDENTIFIER_TARGET}", self.table_url))
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Prefer", "count=exact");
        if self.schema != "public" {
            builder = builder.header("Accept-Profile", &self.schema);
        }
        Ok(builder.build()?)
    }

    /// Row count of the destination table, read from the `Content-Range` total.
    pub async fn count_rows(&self) -> Result<i64> {
        let response = self.client.execute(self.build_count_request()?).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::Sink {
                sink: "rest",
                message: format!("count request failed with HTTP {status}"),
            });
        }
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| LoaderError::Sink {
                sink: "rest",
                message: "count response carried no Content-Range total".into(),
            })
    }
}

/// Total from a PostgREST range such as `0-24/3573` or `*/0`.
fn parse_content_range_total(range: &str) -> Option<i64> {
    let (_, total) = range.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl RecordSink for RestSink {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn write_batch(&mut self, batch: &Batch<LegacyClientRecord>) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let request = self.build_request(&batch.items)?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoaderError::Sink {
                sink: "rest",
                message: format!("HTTP {status}: {}", body.trim()),
            });
        }

        // With return=representation the server echoes only the rows it inserted.
        let inserted: Vec<serde_json::Value> = response.json().await?;
        debug!(batch = batch.sequence, inserted = inserted.len(), "REST batch accepted");

        let written = inserted.len().min(batch.len());
        Ok(BatchOutcome {
            written,
            already_present: batch.len() - written,
        })
    }
}
