mod engine;
mod models;
mod server;
mod storage;
mod types;

use std::io::{stderr, stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::engine::{ImportEngine, ImportRequest, ImportSummary, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::server::DEFAULT_MAX_BODY_BYTES;
use crate::storage::{LedgerStore, MemoryLedgerStore, PostgresLedgerStore};
use crate::types::{Delimiter, TableName};

#[derive(Debug, Parser)]
#[command(name = "cartera-import", version, about = "Replaces the accounts-receivable ledger table with the contents of an ERP CSV export")]
struct Cli {
    /// error, warn, info, debug or trace
    #[arg(long, global = true, env = "CARTERA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// PostgreSQL connection string; without one an in-memory table is used.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Destination ledger table.
    #[arg(long, global = true, env = "CARTERA_TABLE", default_value = "cartera", value_parser = parse_table_name)]
    table: TableName,

    /// Rows per bulk insert, at most 4095.
    #[arg(long, global = true, env = "CARTERA_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    batch_size: usize,

    #[command(subcommand)]
    command: Command
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a CSV file from disk.
    Import {
        path: PathBuf,

        /// One of , ; | or tab (also accepted as \t)
        #[arg(default_value = ";", value_parser = parse_delimiter)]
        delimiter: Delimiter
    },
    /// Serve the import and ledger endpoints over HTTP.
    Serve {
        #[arg(long, env = "CARTERA_BIND", default_value = "0.0.0.0:3001")]
        bind: String,

        #[arg(long, env = "CARTERA_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
        max_body_bytes: usize
    }
}

fn parse_table_name(value: &str) -> Result<TableName, String> {
    TableName::new(value).map_err(|error| error.to_string())
}

fn parse_delimiter(value: &str) -> Result<Delimiter, String> {
    Delimiter::from_cli(value).map_err(|error| error.to_string())
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("batch size must be greater than zero".to_string()),
        Ok(size) if size > MAX_BATCH_SIZE => Err(format!("batch size must be at most {MAX_BATCH_SIZE}")),
        Ok(size) => Ok(size),
        Err(error) => Err(error.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = parse_log_level(&cli.log_level);

    //NOTE: The import command reports its progress on stdout; the server keeps stdout free and logs to stderr
    match &cli.command {
        Command::Import { .. } => setup_logging(level, stdout),
        Command::Serve { .. } => setup_logging(level, stderr)
    }

    match cli.database_url.clone() {
        Some(database_url) => {
            let storage = PostgresLedgerStore::connect(&database_url, cli.table.clone())
                .await
                .context("Could not connect to the ledger database")?;
            storage.ensure_table().await.context("Could not prepare the ledger table")?;

            run(Arc::new(storage), cli).await
        }
        None => {
            warn!("No database configured, importing into an in-memory [{}] table", cli.table);
            run(Arc::new(MemoryLedgerStore::new(cli.table.clone())), cli).await
        }
    }
}

async fn run<S: LedgerStore>(storage: Arc<S>, cli: Cli) -> Result<()> {
    let engine = ImportEngine::new(storage.clone()).with_batch_size(cli.batch_size);

    match cli.command {
        Command::Import { path, delimiter } => import_file(&engine, &path, delimiter).await,
        Command::Serve { bind, max_body_bytes } => {
            info!("Ledger table [{}] holds {} rows", storage.table(), storage.count().await?);
            server::serve(Arc::new(engine), &bind, max_body_bytes).await
        }
    }
}

async fn import_file<S: LedgerStore>(engine: &ImportEngine<S>, path: &Path, delimiter: Delimiter) -> Result<()> {
    if !path.is_file() {
        bail!("CSV file not found at {}", path.display());
    }

    info!("Reading CSV: {}", path.display());
    let bytes = tokio::fs::read(path).await
        .with_context(|| format!("Could not read {}", path.display()))?;

    let file_name = path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let request = ImportRequest::from_bytes(file_name, delimiter.to_string(), bytes)?;
    let summary = engine.run(request).await?;

    write_summary(&summary)?;

    Ok(())
}

fn write_summary(summary: &ImportSummary) -> Result<()> {
    let mut output = stdout().lock();

    writeln!(output, "Import completed")?;
    writeln!(output, "  table:          {}", summary.table)?;
    writeln!(output, "  file:           {}", summary.file_name)?;
    writeln!(output, "  delimiter:      {:?}", summary.delimiter.as_char())?;
    writeln!(output, "  read:           {}", summary.read)?;
    writeln!(output, "  inserted:       {}", summary.inserted)?;
    writeln!(output, "  deleted:        {}", summary.deleted)?;
    writeln!(output, "  batches:        {}", summary.batches)?;
    writeln!(output, "  sequence reset: {}", summary.sequence_reset)?;
    writeln!(output, "  elapsed:        {}ms", summary.elapsed.as_millis())?;

    output.flush()?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    }
}

fn setup_logging<W>(level: LevelFilter, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(writer)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
