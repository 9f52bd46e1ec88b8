//! Node lifecycle
//!
//! Wires the engine to its sockets and background threads.
//!
//! ## Threads
//! - accept loop (plus one per connection)
//! - liveness checker
//! - discovery listener and broadcaster (when enabled)
//! - store and peer-registry workers (owned by the engine)

use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::cluster::{bind_discovery_socket, spawn_broadcaster, spawn_listener, spawn_liveness};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::network::Server;
use crate::protocol::Grammar;

/// A running node
pub struct Node {
    engine: Arc<Engine>,
    local_addr: SocketAddr,
    advertise_addr: String,
    threads: Vec<JoinHandle<()>>,
}

impl Node {
    /// Open the engine, bind sockets and start every background thread
    pub fn start(config: Config) -> Result<Self> {
        let engine = Arc::new(Engine::open(config.clone())?);
        let grammar = Arc::new(Grammar::standard());

        let listener = TcpListener::bind(&config.listen_addr)?;
        let local_addr = listener.local_addr()?;
        let advertise_addr = config
            .advertise_addr
            .clone()
            .unwrap_or_else(|| local_addr.to_string());

        let mut threads = Vec::new();

        let server = Server::new(listener, Arc::clone(&engine), Arc::clone(&grammar));
        threads.push(
            thread::Builder::new()
                .name("accept".to_string())
                .spawn(move || {
                    if let Err(e) = server.run() {
                        tracing::error!(error = %e, "accept loop failed");
                    }
                })?,
        );

        threads.push(spawn_liveness(Arc::clone(&engine), config.check_interval())?);

        if config.discovery_enabled {
            let listen_socket = bind_discovery_socket(config.discovery_port)?;
            threads.push(spawn_listener(
                Arc::clone(&engine),
                Arc::clone(&grammar),
                listen_socket,
            )?);

            let send_socket = UdpSocket::bind("0.0.0.0:0")?;
            threads.push(spawn_broadcaster(
                Arc::clone(&engine),
                send_socket,
                config.broadcast_target()?,
                advertise_addr.clone(),
                config.broadcast_interval(),
            )?);
            tracing::info!(port = config.discovery_port, "discovery enabled");
        }

        tracing::info!(
            identity = %engine.identity(),
            addr = %local_addr,
            advertise = %advertise_addr,
            "node started"
        );

        Ok(Self {
            engine,
            local_addr,
            advertise_addr,
            threads,
        })
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Dial address announced to peers
    pub fn advertise_addr(&self) -> &str {
        &self.advertise_addr
    }

    /// Block until `die` or [`Node::stop`]
    pub fn wait_for_shutdown(&self) {
        self.engine.shutdown().wait();
    }

    /// Trigger shutdown and wake the accept loop
    ///
    /// Open sessions are not interrupted.
    pub fn stop(&self) {
        self.engine.shutdown().trigger();
        Server::wake(self.local_addr);
    }

    /// Stop, join the background threads and close the engine
    pub fn join(mut self) {
        self.stop();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("background thread panicked");
            }
        }
        self.engine.close();
    }
}
