//! RingKV CLI
//!
//! Command-line interface for inspecting and editing a RingKV database.
//! The database is always opened in `Preserve` mode so existing data survives.

use std::process;

use clap::{Parser, Subcommand};
use ringkv::{Config, Engine, OpenMode, RecordValue, SyncStrategy, ValueMode};
use tracing_subscriber::{fmt, EnvFilter};

/// RingKV CLI
#[derive(Parser, Debug)]
#[command(name = "ringkv-cli")]
#[command(about = "CLI for the RingKV file-backed hash index")]
#[command(version)]
struct Args {
    /// Database directory
    #[arg(short, long, default_value = "./ringkv_data")]
    db: String,

    /// Hash buckets per shard
    #[arg(long)]
    slots: Option<u32>,

    /// Index ring capacity per shard
    #[arg(long)]
    records: Option<u32>,

    /// Number of shards
    #[arg(long)]
    files: Option<u32>,

    /// Store payloads in the data log instead of inline scalars
    #[arg(short, long)]
    bytes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a scalar value to a key
    Put {
        key: String,
        value: u32,
    },

    /// Print all scalar values of a key, newest first
    Get {
        key: String,
    },

    /// Append a string payload to a key (requires --bytes)
    PutBytes {
        key: String,
        value: String,
    },

    /// Print all payloads of a key, newest first (requires --bytes)
    GetBytes {
        key: String,
    },

    /// Print the full index records of a key
    Entries {
        key: String,
    },

    /// Print a shard header
    Header {
        shard: u32,
    },

    /// Print the shard and slot a key maps to
    Route {
        key: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,ringkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let defaults = Config::default();
    let config = Config::builder()
        .database_path(&args.db)
        .open_mode(OpenMode::Preserve)
        .sync_strategy(SyncStrategy::OnFlush)
        .value_mode(if args.bytes {
            ValueMode::Bytes
        } else {
            ValueMode::Scalar
        })
        .max_slot_count(args.slots.unwrap_or(defaults.max_slot_count))
        .max_index_count(args.records.unwrap_or(defaults.max_index_count))
        .max_file_count(args.files.unwrap_or(defaults.max_file_count))
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to sync database: {}", e);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> ringkv::Result<()> {
    match command {
        Commands::Put { key, value } => engine.put(&key, value)?,
        Commands::Get { key } => {
            for value in engine.get(&key)? {
                println!("{}", value);
            }
        }
        Commands::PutBytes { key, value } => engine.put_bytes(&key, value.as_bytes())?,
        Commands::GetBytes { key } => {
            for payload in engine.get_bytes(&key)? {
                println!("{}", String::from_utf8_lossy(&payload));
            }
        }
        Commands::Entries { key } => {
            for entry in engine.get_entries(&key)? {
                let value = match entry.value {
                    RecordValue::Scalar(v) => format!("scalar={}", v),
                    RecordValue::Offset(o) => format!("offset={}", o),
                };
                let prev = entry
                    .chain_prev
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} {} elapsed={}s prev={}", entry.key, value, entry.time_elapsed, prev);
            }
        }
        Commands::Header { shard } => match engine.shard_header(shard) {
            Some(h) => println!(
                "shard={} begin={} end={} next_index={} next_data={}",
                shard, h.begin_time, h.end_time, h.next_index, h.next_data
            ),
            None => return Err(ringkv::RingError::ShardNotOpen { shard }),
        },
        Commands::Route { key } => {
            let route = engine.route(&key);
            println!(
                "hash={:#010x} shard={} slot={}",
                route.key_hash, route.shard, route.slot
            );
        }
    }
    Ok(())
}
