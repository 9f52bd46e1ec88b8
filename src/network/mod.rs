//! Network Module
//!
//! TCP server, sessions and client.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per connection running a [`Session`]
//! - Commands routed through the Engine

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::{Connection, Session};
pub use server::Server;
