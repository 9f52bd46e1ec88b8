//! Cluster Module
//!
//! Peer discovery, replication fan-out and liveness probing.
//!
//! ## Architecture
//! - Broadcaster thread: periodic `hst` datagram with this node's identity and
//!   dial address
//! - Discovery listener thread: admits other nodes' `hst` into the registry
//! - Liveness thread: periodic `chk`, which fans a `nop` out to every peer
//! - Fan-out runs inline on the session that applied the mutation, one peer
//!   at a time; any failure evicts that peer
//!
//! Replication is best effort: no retries, no ordering across peers, last
//! write wins locally.

mod discovery;
mod identity;
mod liveness;
mod registry;
mod replicator;

pub use discovery::{bind_discovery_socket, handle_datagram, spawn_broadcaster, spawn_listener};
pub use identity::node_identity;
pub use liveness::spawn_liveness;
pub use registry::{Peer, PeerRegistry};
pub use replicator::{FanOutReport, Replicator};
