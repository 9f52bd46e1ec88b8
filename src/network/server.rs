//! TCP Server
//!
//! Accepts connections and runs one session thread per connection.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::Grammar;

use super::connection::Connection;

/// TCP accept loop for a node
pub struct Server {
    listener: TcpListener,
    engine: Arc<Engine>,
    grammar: Arc<Grammar>,
}

impl Server {
    /// Serve connections accepted on an already bound listener
    pub fn new(listener: TcpListener, engine: Arc<Engine>, grammar: Arc<Grammar>) -> Self {
        Self {
            listener,
            engine,
            grammar,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept until shutdown (blocking)
    ///
    /// The shutdown check runs after each accept, so a wake-up connection is
    /// needed to stop a loop that is idle.
    pub fn run(&self) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "listening");

        for stream in self.listener.incoming() {
            if self.engine.shutdown().is_triggered() {
                break;
            }
            match stream {
                Ok(stream) => self.spawn_session(stream),
                Err(e) => tracing::warn!(error = %e, "error accepting connection"),
            }
        }

        tracing::debug!("accept loop stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream) {
        let engine = Arc::clone(&self.engine);
        let grammar = Arc::clone(&self.grammar);

        let spawned = thread::Builder::new()
            .name("session".to_string())
            .spawn(move || {
                let config = engine.config().clone();
                let mut connection = match Connection::new(stream, engine, grammar, &config) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!(error = %e, "cannot set up connection");
                        return;
                    }
                };
                if let Err(e) = connection.handle() {
                    tracing::warn!(
                        peer = %connection.peer_addr(),
                        error = %e,
                        "session failed"
                    );
                }
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "cannot spawn session thread");
        }
    }

    /// Unblock an idle accept loop after shutdown has been triggered
    pub fn wake(addr: SocketAddr) {
        let _ = TcpStream::connect(wake_target(addr));
    }
}

/// Connecting to 0.0.0.0 is not portable; use loopback for the same port
fn wake_target(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        let loopback = if addr.is_ipv4() {
            std::net::Ipv4Addr::LOCALHOST.into()
        } else {
            std::net::Ipv6Addr::LOCALHOST.into()
        };
        SocketAddr::new(loopback, addr.port())
    } else {
        addr
    }
}
