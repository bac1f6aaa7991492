use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use legacy_clients_core::config::{ExclusionSource, LoaderConfig};
use legacy_clients_core::db::{self, DbPool};
use legacy_clients_core::dedup::build_filter;
use legacy_clients_core::ingestion::{run_import, ImportReport};
use legacy_clients_core::sink::{PostgresSink, RecordSink, RestSink, SqlTarget, SqlTextSink};
use legacy_clients_parser::{ClientInputs, RowOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod summary;

use summary::ImportSummary;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load legacy client exports into the client store", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Export file or glob pattern (overrides the config file and LEGACY_CLIENTS_INPUT)
    #[arg(long, global = true)]
    input: Option<String>,

    /// Records per write
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run database migrations
    Migrate,
    /// Load the export into the destination table
    Import(ImportArgs),
    /// Write the export as SQL insert statements
    EmitSql(EmitSqlArgs),
    /// Show the first normalized records without writing anything
    Preview(PreviewArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    Postgres,
    Rest,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(long, value_enum, default_value_t = SinkKind::Postgres)]
    sink: SinkKind,

    /// Skip running migrations before a Postgres import
    #[arg(long)]
    skip_migrations: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct EmitSqlArgs {
    /// Output file, or `-` for stdout
    #[arg(long, default_value = "-", conflicts_with = "split_dir")]
    out: String,

    /// Write one file per batch into this directory instead
    #[arg(long)]
    split_dir: Option<PathBuf>,

    /// Do not wrap the script in BEGIN/COMMIT
    #[arg(long)]
    no_transaction: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Number of records to show
    #[arg(short = 'n', long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Migrate => {
            config.validate_for_migrations()?;
            let pool = connect_pool(&config).await?;
            db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
            info!("Database migrations applied");
            Ok(())
        }
        Command::Import(args) => match args.sink {
            SinkKind::Postgres => import_postgres(&config, &args).await,
            SinkKind::Rest => import_rest(&config, &args).await,
        },
        Command::EmitSql(args) => emit_sql(&config, &args).await,
        Command::Preview(args) => preview(&config, args.limit),
    }
}

fn resolve_config(cli: &Cli) -> Result<LoaderConfig> {
    let mut config =
        LoaderConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(input) = &cli.input {
        config.input = Some(input.clone());
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;
    Ok(config)
}

async fn connect_pool(config: &LoaderConfig) -> Result<DbPool> {
    let url = config.database_url()?;
    db::connect(url)
        .await
        .context("failed to connect to the database")
}

/// A pool is only needed for exclusion when ids come from the destination.
async fn exclusion_pool(config: &LoaderConfig) -> Result<Option<DbPool>> {
    if config.exclusion == ExclusionSource::Destination {
        Ok(Some(connect_pool(config).await?))
    } else {
        Ok(None)
    }
}

fn open_rows(config: &LoaderConfig) -> Result<ClientInputs> {
    let input = config.input()?;
    let options = config.reader_options()?;
    ClientInputs::open(input, options).with_context(|| format!("failed to open input {input}"))
}

async fn run_with<S: RecordSink>(
    config: &LoaderConfig,
    pool: Option<&DbPool>,
    sink: &mut S,
) -> Result<ImportReport> {
    let mut filter = build_filter(&config.exclusion, pool, &config.destination)
        .await
        .context("failed to load the exclusion set")?;
    let rows = open_rows(config)?;
    info!(
        input = config.input()?,
        sink = sink.name(),
        batch_size = config.batch_size,
        "Starting import"
    );
    let report = run_import(rows, &mut filter, config.batch_size, sink)
        .await
        .context("import aborted")?;
    Ok(report)
}

async fn import_postgres(config: &LoaderConfig, args: &ImportArgs) -> Result<()> {
    config.validate_for_postgres()?;
    if !args.skip_migrations {
        config.validate_for_migrations()?;
    }
    let pool = connect_pool(config).await?;
    if args.skip_migrations {
        warn!("Skipping migrations before import");
    } else {
        db::run_migrations(&pool)
            .await
            .context("failed to apply migrations")?;
    }

    let before = db::count_rows(&pool, &config.destination).await?;
    let mut sink = PostgresSink::new(pool.clone(), &config.destination);
    let report = run_with(config, Some(&pool), &mut sink).await?;
    let after = db::count_rows(&pool, &config.destination).await?;

    let summary = ImportSummary::new("postgres", report).with_row_counts(before, after);
    summary.print(args.json)
}

async fn import_rest(config: &LoaderConfig, args: &ImportArgs) -> Result<()> {
    let mut sink = RestSink::new(&config.rest, &config.destination)?;
    let pool = exclusion_pool(config).await?;

    let before = sink
        .count_rows()
        .await
        .context("failed to count destination rows")?;
    let report = run_with(config, pool.as_ref(), &mut sink).await?;
    let after = sink
        .count_rows()
        .await
        .context("failed to count destination rows")?;

    ImportSummary::new("rest", report)
        .with_row_counts(before, after)
        .print(args.json)
}

async fn emit_sql(config: &LoaderConfig, args: &EmitSqlArgs) -> Result<()> {
    let target = match &args.split_dir {
        Some(dir) => SqlTarget::Directory(dir.clone()),
        None if args.out == "-" => SqlTarget::stdout(),
        None => SqlTarget::file(PathBuf::from(&args.out))
            .with_context(|| format!("failed to create {}", args.out))?,
    };
    let wrap_transaction = config.sql.wrap_transaction && !args.no_transaction;
    let mut sink = SqlTextSink::new(
        target,
        &config.destination,
        config.input()?,
        wrap_transaction,
    )?;

    let pool = exclusion_pool(config).await?;
    let report = run_with(config, pool.as_ref(), &mut sink).await?;

    // stdout may be carrying the SQL itself.
    eprintln!("{}", summary::report_table(&report, None));
    Ok(())
}

fn preview(config: &LoaderConfig, limit: usize) -> Result<()> {
    let mut records = Vec::with_capacity(limit);
    let mut rejected = 0usize;
    for row in open_rows(config)? {
        if records.len() >= limit {
            break;
        }
        match row? {
            RowOutcome::Record(record) => records.push(record),
            RowOutcome::Rejected(rejection) => {
                rejected += 1;
                warn!(line = rejection.line, reason = %rejection.reason, "Skipping row");
            }
        }
    }

    println!("{}", summary::preview_table(&records));
    println!("{} record(s) shown, {rejected} row(s) skipped", records.len());
    Ok(())
}
