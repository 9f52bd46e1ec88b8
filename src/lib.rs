//! # HiveKV
//!
//! A replicated in-memory key-value node:
//! - Every node holds the full key space
//! - Clients speak a streaming, length-framed text protocol over TCP
//! - Nodes find each other with UDP broadcasts on the local network
//! - Mutations are fanned out to every known peer, best effort
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              TCP Server (one session per client)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes → Parser → Message
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine (command dispatcher)                  │
//! └──────────┬──────────────────────┬───────────────────────────┘
//!            │                      │
//!            ▼                      ▼
//!   ┌─────────────────┐    ┌─────────────────┐     ┌───────────┐
//!   │     KvStore     │    │   Replicator    │ ◄── │ Discovery │
//!   │ (worker thread) │    │ (PeerRegistry)  │     │   (UDP)   │
//!   └─────────────────┘    └────────┬────────┘     └───────────┘
//!                                   │ spt / sdl / nop
//!                                   ▼
//!                              other nodes
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod shutdown;

pub mod protocol;
pub mod store;
pub mod cluster;
pub mod engine;
pub mod network;
pub mod node;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HiveError, Result};
pub use config::Config;
pub use engine::Engine;
pub use node::Node;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of HiveKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
