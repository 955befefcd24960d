use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use orderflow::application::engine::{CancellationPolicy, EngineConfig};
use orderflow::domain::order::OrderFilter;
use orderflow::domain::ports::LedgerStoreRef;
use orderflow::infrastructure::in_memory::InMemoryLedger;
#[cfg(feature = "storage-rocksdb")]
use orderflow::infrastructure::rocksdb::RocksDbLedger;
use orderflow::interfaces::command::CommandDispatcher;
use orderflow::interfaces::csv::report_writer::ReportWriter;
use orderflow::interfaces::jsonl::command_reader::CommandReader;
use orderflow::telemetry::init_tracing;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Copy, ValueEnum)]
enum Report {
    Orders,
    Stock,
    Loyalty,
}

#[derive(Clone, Copy, ValueEnum)]
enum Cancellation {
    /// Return reserved stock to the branch when a paid order is canceled
    Restock,
    /// Keep stock committed to canceled orders
    Retain,
}

impl From<Cancellation> for CancellationPolicy {
    fn from(value: Cancellation) -> Self {
        match value {
            Cancellation::Restock => CancellationPolicy::Restock,
            Cancellation::Retain => CancellationPolicy::Retain,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command script (JSON Lines)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Report written to stdout once all commands ran
    #[arg(long, value_enum, default_value_t = Report::Orders)]
    report: Report,

    /// What a cancellation does to reserved stock
    #[arg(long, value_enum, default_value_t = Cancellation::Restock)]
    cancellation: Cancellation,
}

fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            tracing::info!(path = %path.display(), "using RocksDB ledger");
            Ok(Arc::new(RocksDbLedger::open(path)?))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryLedger::new()))
        }
        None => Ok(Arc::new(InMemoryLedger::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let store = open_store(cli.db_path.as_deref())?;
    let config = EngineConfig {
        cancellation: cli.cancellation.into(),
    };
    let dispatcher = CommandDispatcher::new(store, config);

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(BufReader::new(file));
    for (line, parsed) in reader.commands() {
        match parsed {
            Ok(command) => {
                if let Err(e) = dispatcher.apply(command).await {
                    warn!(line, kind = ?e.kind(), "Error processing command: {}", e);
                }
            }
            Err(e) => {
                warn!(line, "Error reading command: {}", e);
            }
        }
    }

    // Output final state
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    match cli.report {
        Report::Orders => {
            let orders = dispatcher.engine().list_orders(OrderFilter::default()).await?;
            writer.write_orders(&orders)?;
        }
        Report::Stock => {
            let levels = dispatcher.engine().stock_levels().await?;
            writer.write_stock(&levels)?;
        }
        Report::Loyalty => {
            let users = dispatcher.catalog().users().await?;
            writer.write_loyalty(&users)?;
        }
    }

    Ok(())
}
