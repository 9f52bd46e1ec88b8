//! Connection Handler
//!
//! Handles individual client (or peer) connections.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::{Engine, Flow};
use crate::error::{HiveError, Result};
use crate::protocol::{Grammar, Parser};

/// Parse, dispatch, respond
///
/// Socket-free so it can be driven from any byte source.
pub struct Session {
    engine: Arc<Engine>,
    parser: Parser,
}

impl Session {
    pub fn new(engine: Arc<Engine>, grammar: Arc<Grammar>) -> Self {
        Self {
            engine,
            parser: Parser::new(grammar),
        }
    }

    /// Feed received bytes, writing each reply to `out` before moving on
    ///
    /// Stops at the first message that ends the session; bytes after it are
    /// discarded.
    pub fn handle_bytes<W: Write>(&mut self, bytes: &[u8], out: &mut W) -> Result<Flow> {
        for &byte in bytes {
            match self.parser.process(byte) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) if e.is_protocol() => {
                    tracing::debug!(error = %e, "malformed input");
                    out.write_all(b"err")?;
                    out.flush()?;
                    continue;
                }
                Err(e) => return Err(e),
            }

            let message = match self.parser.get_message() {
                Ok(message) => message,
                Err(e) => panic!("parser reported a complete message but has none: {}", e),
            };

            let outcome = self.engine.execute(&message);
            if !outcome.response.is_empty() {
                out.write_all(&outcome.response.to_bytes())?;
                out.flush()?;
            }

            match outcome.flow {
                Flow::Continue => {}
                Flow::EndSession => return Ok(Flow::EndSession),
                Flow::Shutdown => {
                    self.engine.shutdown().trigger();
                    return Ok(Flow::Shutdown);
                }
            }
        }
        Ok(Flow::Continue)
    }
}

/// Handles a single TCP connection
pub struct Connection {
    stream: TcpStream,
    session: Session,
    buffer: Vec<u8>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Disables Nagle and applies the configured timeouts.
    pub fn new(
        stream: TcpStream,
        engine: Arc<Engine>,
        grammar: Arc<Grammar>,
        config: &Config,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        Ok(Self {
            stream,
            session: Session::new(engine, grammar),
            buffer: vec![0u8; config.read_buffer_size],
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(peer = %self.peer_addr, "connection established");

        loop {
            let count = match self.stream.read(&mut self.buffer) {
                Ok(0) => {
                    tracing::debug!(peer = %self.peer_addr, "client disconnected");
                    return Ok(());
                }
                Ok(count) => count,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if is_disconnect(e.kind()) => {
                    tracing::debug!(peer = %self.peer_addr, error = %e, "connection closed");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            match self.session.handle_bytes(&self.buffer[..count], &mut self.stream) {
                Ok(Flow::Continue) => {}
                Ok(flow) => {
                    tracing::debug!(peer = %self.peer_addr, ?flow, "session ended");
                    return Ok(());
                }
                Err(HiveError::Io(e)) if is_disconnect(e.kind()) => {
                    tracing::debug!(
                        peer = %self.peer_addr,
                        error = %e,
                        "client left before reply"
                    );
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
