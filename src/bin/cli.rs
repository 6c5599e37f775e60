//! AnchorKV CLI
//!
//! Command-line interface for a local AnchorKV data directory.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anchorkv::wal::{self, Operation, WalReader};
use anchorkv::{Config, Context, Engine, KvStore, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// AnchorKV CLI
#[derive(Parser, Debug)]
#[command(name = "anchorkv")]
#[command(about = "Durable key-value store backed by a write-ahead log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./anchorkv_data")]
    data_dir: PathBuf,

    /// Per-operation timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Print every record in a WAL file
    Inspect {
        /// WAL file (defaults to the data directory's log)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Check a WAL file's integrity without modifying it
    Verify {
        /// WAL file (defaults to the data directory's log)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,anchorkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder().data_dir(&args.data_dir);
    if let Some(ms) = args.timeout_ms {
        builder = builder.op_timeout(Duration::from_millis(ms));
    }
    let config = builder.build();

    match run(config, args.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Get { key } => {
            let engine = Engine::open(config)?;
            let ctx = engine.config().context();
            let value = engine.store().get(&ctx, &key);
            engine.close(&Context::background())?;
            println!("{}", String::from_utf8_lossy(&value?));
        }
        Commands::Put { key, value } => {
            let engine = Engine::open(config)?;
            let ctx = engine.config().context();
            let result = engine.store().put(&ctx, &key, value.as_bytes());
            engine.close(&Context::background())?;
            result?;
            println!("OK");
        }
        Commands::Delete { key } => {
            let engine = Engine::open(config)?;
            let ctx = engine.config().context();
            let result = engine.store().delete(&ctx, &key);
            engine.close(&Context::background())?;
            result?;
            println!("OK");
        }
        Commands::Inspect { path } => {
            let path = path.unwrap_or_else(|| config.wal_path());
            let mut reader = WalReader::open(&path)?;
            loop {
                let offset = reader.offset();
                match reader.next_record() {
                    Ok(Some(record)) => {
                        let op = match record.operation {
                            Operation::Put => "PUT",
                            Operation::Delete => "DEL",
                        };
                        println!(
                            "{:>10}  {:>20}  {}  {}  ({} bytes)",
                            offset,
                            record.timestamp,
                            op,
                            String::from_utf8_lossy(&record.key),
                            record.value.len()
                        );
                    }
                    Ok(None) => break,
                    Err(e) => {
                        println!("{:>10}  error ({:?}): {}", offset, e.kind(), e);
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Commands::Verify { path } => {
            let path = path.unwrap_or_else(|| config.wal_path());
            let report = wal::verify(&path)?;
            println!(
                "{}: {} valid records, {} valid bytes, {}",
                path.display(),
                report.valid_records,
                report.valid_bytes,
                report.status
            );
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
