//! tagframe Server Binary
//!
//! Serves one storage (file-backed or in-memory) over TCP.

use std::path::PathBuf;

use clap::Parser;
use tagframe::network::Server;
use tagframe::{Config, FileStorage, MemoryStorage, Storage, SyncMode};
use tracing_subscriber::{fmt, EnvFilter};

/// tagframe Server
#[derive(Parser, Debug)]
#[command(name = "tagframe-server")]
#[command(about = "Expose a tagframe storage over TCP")]
#[command(version)]
struct Args {
    /// Backing file (omit to serve an in-memory storage)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7411")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Per-connection read timeout in milliseconds (0 disables)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// sync_data after every write to the backing file
    #[arg(long)]
    sync: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tagframe=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("tagframe Server v{}", tagframe::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let sync_mode = if args.sync {
        SyncMode::EveryWrite
    } else {
        SyncMode::Never
    };

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .sync_mode(sync_mode)
        .build();

    // Open storage
    let storage: Box<dyn Storage> = match &args.file {
        Some(path) => match FileStorage::open_with(path, sync_mode) {
            Ok(file) => {
                tracing::info!("Serving file {}", path.display());
                Box::new(file)
            }
            Err(e) => {
                tracing::error!("Failed to open {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("Serving in-memory storage");
            Box::new(MemoryStorage::new())
        }
    };

    // Start server
    let mut server = Server::new(config, storage);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
