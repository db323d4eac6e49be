//! RedoKV Server Binary
//!
//! Replays the redo log, then serves the line protocol over TCP.

use std::sync::Arc;

use clap::Parser;
use redokv::config::{SyncPolicy, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_ROOT};
use redokv::network::Server;
use redokv::{Config, Storage};
use tracing_subscriber::{fmt, EnvFilter};

/// RedoKV Server
#[derive(Parser, Debug)]
#[command(name = "redokv-server")]
#[command(about = "Key-value cache with a redo log, served over a text line protocol")]
#[command(version)]
struct Args {
    /// Root directory for the redo log
    #[arg(short, long, default_value = DEFAULT_ROOT)]
    root: String,

    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address of an upstream primary (accepted, currently unused)
    #[arg(short, long, default_value = "")]
    master: String,

    /// Listen host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// fsync the redo log every N writes (1 = every write)
    #[arg(short = 's', long, default_value_t = 1)]
    sync_every: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,redokv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("RedoKV Server v{}", redokv::VERSION);
    tracing::info!("Root directory: {}", args.root);

    let config = match Config::builder()
        .root(&args.root)
        .port(args.port)
        .master(args.master)
        .host(args.host)
        .sync_policy(SyncPolicy::every(args.sync_every))
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Replay happens here, before the listener exists
    let storage = match Storage::open(&config) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Storage ready with {} keys", storage.len());

    let server = match Server::bind(config, storage) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Listen error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
