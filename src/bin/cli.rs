//! HiveKV CLI Client
//!
//! Command-line interface for interacting with a HiveKV node.

use std::time::Duration;

use clap::{Parser, Subcommand};
use hivekv::network::Client;
use hivekv::Result;

/// HiveKV CLI
#[derive(Parser, Debug)]
#[command(name = "hivekv-cli")]
#[command(about = "CLI for HiveKV key-value nodes")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    server: String,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

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

    /// Set a key-value pair (replicated to peers)
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key (replicated to peers)
    Del {
        /// The key to delete
        key: String,
    },

    /// Get the first LENGTH bytes of a value (0 for all)
    Head {
        key: String,
        length: usize,
    },

    /// Check the node is alive
    Nop,

    /// Shut the node down
    Die,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;
    client.set_timeout(Some(Duration::from_millis(args.timeout_ms)))?;

    match args.command {
        Commands::Get { key } => print_value(client.get(key.as_bytes())?),
        Commands::Head { key, length } => print_value(client.head(key.as_bytes(), length)?),
        Commands::Put { key, value } => {
            client.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            client.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Nop => {
            client.nop()?;
            println!("OK");
        }
        Commands::Die => {
            client.die()?;
            println!("OK");
            return Ok(());
        }
    }

    client.bye()
}

fn print_value(value: Option<bytes::Bytes>) {
    match value {
        Some(value) => println!("{}", String::from_utf8_lossy(&value)),
        None => println!("(nil)"),
    }
}
