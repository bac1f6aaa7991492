use std::collections::HashSet;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres, Row};

use crate::config::DestinationConfig;
use crate::error::Result;

pub type DbPool = Pool<Postgres>;

/// Establish a Postgres connection pool. The loader writes sequentially, so
/// a couple of connections is plenty.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations embedded at compile-time.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Client ids already present in the destination table.
pub async fn load_existing_ids(
    pool: &DbPool,
    destination: &DestinationConfig,
) -> Result<HashSet<i64>> {
    let sql = format!(
        "SELECT legacy_client_id::BIGINT AS legacy_client_id FROM {}",
        destination.qualified_name()
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let mut ids = HashSet::with_capacity(rows.len());
    for row in rows {
        ids.insert(row.try_get::<i64, _>("legacy_client_id")?);
    }
    Ok(ids)
}

pub async fn count_rows(pool: &DbPool, destination: &DestinationConfig) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", destination.qualified_name());
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}
