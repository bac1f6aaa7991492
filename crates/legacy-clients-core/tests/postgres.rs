use std::env;

use anyhow::Result;
use legacy_clients_core::config::{DestinationConfig, ExclusionSource};
use legacy_clients_core::dedup::build_filter;
use legacy_clients_core::ingestion::run_import;
use legacy_clients_core::sink::PostgresSink;
use legacy_clients_core::db;
use legacy_clients_parser::{ClientInputs, ReaderOptions};

fn fixture(name: &str) -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../legacy-clients-parser/tests/data")
        .join(name)
        .display()
        .to_string()
}

#[tokio::test]
async fn reimport_is_idempotent_when_database_available() -> Result<()> {
    let database_url = match env::var("LEGACY_CLIENTS_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping postgres test because LEGACY_CLIENTS_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let pool = db::connect(&database_url).await?;
    db::run_migrations(&pool).await?;

    let destination = DestinationConfig::default();
    sqlx::query("DELETE FROM legacy_clients WHERE legacy_client_id IN (1781, 1742, 1860, 1567)")
        .execute(&pool)
        .await?;
    let before = db::count_rows(&pool, &destination).await?;

    let mut sink = PostgresSink::new(pool.clone(), &destination);
    let mut filter = build_filter(&ExclusionSource::None, None, &destination).await?;
    let rows = ClientInputs::open(&fixture("clients.csv"), ReaderOptions::default())?;
    let first = run_import(rows, &mut filter, 2, &mut sink).await?;

    assert_eq!(first.records_written, 4);
    assert_eq!(first.records_already_present, 0);
    assert_eq!(db::count_rows(&pool, &destination).await? - before, 4);

    let mut filter = build_filter(&ExclusionSource::None, None, &destination).await?;
    let rows = ClientInputs::open(&fixture("clients.csv"), ReaderOptions::default())?;
    let second = run_import(rows, &mut filter, 2, &mut sink).await?;

    assert_eq!(second.records_written, 0);
    assert_eq!(second.records_already_present, 4);
    assert_eq!(db::count_rows(&pool, &destination).await? - before, 4);

    let ativo: Option<bool> =
        sqlx::query_scalar("SELECT ativo FROM legacy_clients WHERE legacy_client_id = 1781")
            .fetch_one(&pool)
            .await?;
    assert_eq!(ativo, Some(true));

    let known = db::load_existing_ids(&pool, &destination).await?;
    assert!(known.contains(&1860));

    let mut filter = build_filter(&ExclusionSource::Destination, Some(&pool), &destination).await?;
    let rows = ClientInputs::open(&fixture("clients.csv"), ReaderOptions::default())?;
    let third = run_import(rows, &mut filter, 2, &mut sink).await?;
    assert_eq!(third.excluded, 4);
    assert_eq!(third.batches_written, 0);

    Ok(())
}
