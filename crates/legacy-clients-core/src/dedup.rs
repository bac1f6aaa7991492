use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::config::{DestinationConfig, ExclusionSource};
use crate::db::{self, DbPool};
use crate::error::{LoaderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    /// The id is already materialized at the destination.
    Excluded,
    /// The id was admitted earlier in this run.
    Duplicate,
}

/// Identifier-based inclusion policy.
#[derive(Debug, Default)]
pub struct DedupFilter {
    known: HashSet<i64>,
    admitted: HashSet<i64>,
}

impl DedupFilter {
    pub fn new(known: HashSet<i64>) -> Self {
        Self {
            known,
            admitted: HashSet::new(),
        }
    }

    pub fn decide(&mut self, legacy_client_id: i64) -> Decision {
        if self.known.contains(&legacy_client_id) {
            Decision::Excluded
        } else if self.admitted.insert(legacy_client_id) {
            Decision::Accept
        } else {
            Decision::Duplicate
        }
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }
}

/// Parse an id list with one integer per line; blank lines and `#` comments
/// are ignored.
pub fn parse_id_list(contents: &str) -> Result<HashSet<i64>> {
    let mut ids = HashSet::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let id = line.parse::<i64>().map_err(|_| {
            LoaderError::Config(format!(
                "exclusion list line {} is not an integer id: {line:?}",
                index + 1
            ))
        })?;
        ids.insert(id);
    }
    Ok(ids)
}

pub fn read_id_file(path: &Path) -> Result<HashSet<i64>> {
    let contents = std::fs::read_to_string(path)?;
    parse_id_list(&contents)
}

/// Materialize the configured exclusion source into a filter.
pub async fn build_filter(
    source: &ExclusionSource,
    pool: Option<&DbPool>,
    destination: &DestinationConfig,
) -> Result<DedupFilter> {
    let known = match source {
        ExclusionSource::None => HashSet::new(),
        ExclusionSource::Static { ids } => ids.iter().copied().collect(),
        ExclusionSource::File { path } => read_id_file(path)?,
        ExclusionSource::Destination => {
            let pool = pool.ok_or_else(|| {
                LoaderError::Config(
                    "exclusion source 'destination' needs a database connection".into(),
                )
            })?;
            db::load_existing_ids(pool, destination).await?
        }
    };

    if !known.is_empty() {
        info!(known = known.len(), "Loaded client ids to exclude");
    }
    Ok(DedupFilter::new(known))
}
