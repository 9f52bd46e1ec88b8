//! HiveKV Server Binary
//!
//! Starts a replicated node: TCP client port plus UDP discovery.

use clap::Parser;
use hivekv::{Config, Node};
use tracing_subscriber::{fmt, EnvFilter};

/// HiveKV Server
#[derive(Parser, Debug)]
#[command(name = "hivekv-server")]
#[command(about = "Replicated in-memory key-value node")]
#[command(version)]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host to bind the TCP listener to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// UDP port for discovery broadcasts
    #[arg(short, long, default_value = "9000")]
    udp_port: u16,

    /// Subnet broadcast address for discovery
    #[arg(short, long, default_value = "255.255.255.255")]
    broadcast: String,

    /// Dial address announced to peers (defaults to the bound address)
    #[arg(short, long)]
    advertise: Option<String>,

    /// Override the node identity
    #[arg(long)]
    node_id: Option<String>,

    /// Run standalone without UDP discovery
    #[arg(long)]
    no_discovery: bool,

    /// Milliseconds between discovery broadcasts
    #[arg(long, default_value = "3000")]
    broadcast_interval_ms: u64,

    /// Milliseconds between peer liveness checks
    #[arg(long, default_value = "5000")]
    check_interval_ms: u64,

    /// Per-peer replication deadline in milliseconds
    #[arg(long, default_value = "800")]
    replication_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hivekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("HiveKV Server v{}", hivekv::VERSION);

    let mut builder = Config::builder()
        .listen_addr(format!("{}:{}", args.host, args.port))
        .discovery_enabled(!args.no_discovery)
        .discovery_port(args.udp_port)
        .broadcast_addr(&args.broadcast)
        .broadcast_interval_ms(args.broadcast_interval_ms)
        .check_interval_ms(args.check_interval_ms)
        .replication_timeout_ms(args.replication_timeout_ms);
    if let Some(addr) = &args.advertise {
        builder = builder.advertise_addr(addr);
    }
    if let Some(id) = &args.node_id {
        builder = builder.node_id(id);
    }
    let config = builder.build();

    let node = match Node::start(config) {
        Ok(node) => node,
        Err(e) => {
            tracing::error!("Failed to start node: {}", e);
            std::process::exit(1);
        }
    };

    // Returns on `die`; Ctrl+C terminates the process directly
    node.wait_for_shutdown();
    node.join();

    tracing::info!("Server stopped");
}
