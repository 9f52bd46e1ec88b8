//! Engine Module
//!
//! The command dispatcher: maps each decoded message onto the store, the peer
//! registry and the replicator.
//!
//! ## Responsibilities
//! - Own the data store and the peer registry
//! - Apply client mutations locally, then fan them out to peers
//! - Apply peer mutations without fanning out again
//! - Turn every internal error into a reply token
//!
//! Each message causes at most one store mutation, one fan-out and one reply.

use std::sync::Arc;

use crate::cluster::{node_identity, FanOutReport, PeerRegistry, Replicator};
use crate::config::Config;
use crate::error::{HiveError, Result};
use crate::protocol::{Command, Message, Response};
use crate::shutdown::Shutdown;
use crate::store::KvStore;

/// What the session should do after writing the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Close this connection only
    EndSession,
    /// Close this connection and stop the node
    Shutdown,
}

/// Reply plus follow-up for one dispatched message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub response: Response,
    pub flow: Flow,
}

impl Outcome {
    fn reply(response: Response) -> Self {
        Self {
            response,
            flow: Flow::Continue,
        }
    }
}

/// The node's dispatcher and state owner
pub struct Engine {
    config: Config,

    /// Identity announced to peers
    identity: String,

    /// Replicated key/value data
    store: KvStore,

    /// Peer identity → dial address
    peers: Arc<PeerRegistry>,

    replicator: Replicator,

    shutdown: Shutdown,
}

impl Engine {
    /// Open the store and peer registry
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let identity = config.node_id.clone().unwrap_or_else(node_identity);
        let store = KvStore::open_new("data")?;
        let peers = Arc::new(PeerRegistry::open()?);
        let replicator = Replicator::new(Arc::clone(&peers), config.replication_timeout());

        tracing::info!(identity = %identity, "engine opened");

        Ok(Self {
            config,
            identity,
            store,
            peers,
            replicator,
            shutdown: Shutdown::new(),
        })
    }

    /// Dispatch one message
    pub fn execute(&self, message: &Message) -> Outcome {
        let command = Command::from_token(&message.command);
        tracing::debug!(command = %message.command, "handling command");

        let (key, value) = (&message.arg1[..], &message.arg2[..]);
        let response = match command {
            Command::Get => self.handle_get(key),
            Command::Put => self.handle_put(key, value),
            Command::Delete => self.handle_delete(key),
            Command::SyncPut => self.handle_sync_put(key, value),
            Command::SyncDelete => self.handle_sync_delete(key),
            Command::Head => self.handle_head(key, value),
            Command::Host => self.handle_host(key, value),
            Command::Check => self.handle_check(),
            Command::Nop => Response::Ack,
            Command::Bye => {
                return Outcome {
                    response: Response::Empty,
                    flow: Flow::EndSession,
                }
            }
            Command::Die => {
                return Outcome {
                    response: Response::Ack,
                    flow: Flow::Shutdown,
                }
            }
            Command::Unknown => {
                tracing::debug!(command = %message.command, "no handler for command");
                Response::Err
            }
        };

        if response == Response::Err {
            tracing::debug!(
                command = %message.command,
                key_len = key.len(),
                value_len = value.len(),
                "returning err"
            );
        }
        Outcome::reply(response)
    }

    fn handle_get(&self, key: &[u8]) -> Response {
        match self.store.get(key) {
            Ok(value) => Response::value(value),
            Err(HiveError::KeyNotFound) => Response::Nil,
            Err(e) => {
                tracing::warn!(error = %e, "get failed");
                Response::Err
            }
        }
    }

    fn handle_put(&self, key: &[u8], value: &[u8]) -> Response {
        match self.store.upsert(key, value) {
            Ok(_) => {
                self.replicate("spt", key, value);
                Response::Ack
            }
            Err(e) => {
                tracing::warn!(error = %e, "put failed");
                Response::Err
            }
        }
    }

    fn handle_delete(&self, key: &[u8]) -> Response {
        match self.store.delete(key) {
            Ok(()) => {
                self.replicate("sdl", key, b"");
                Response::Ack
            }
            Err(e) => {
                tracing::warn!(error = %e, "delete failed");
                Response::Err
            }
        }
    }

    fn handle_sync_put(&self, key: &[u8], value: &[u8]) -> Response {
        match self.store.upsert(key, value) {
            Ok(_) => Response::Ack,
            Err(_) => Response::Err,
        }
    }

    fn handle_sync_delete(&self, key: &[u8]) -> Response {
        match self.store.delete(key) {
            Ok(()) => Response::Ack,
            Err(_) => Response::Err,
        }
    }

    /// Value truncated to `length` bytes; `0` or a length past the end returns
    /// the whole value
    fn handle_head(&self, key: &[u8], length: &[u8]) -> Response {
        let value = match self.store.get(key) {
            Ok(value) => value,
            Err(HiveError::KeyNotFound) => return Response::Nil,
            Err(_) => return Response::Err,
        };

        let Some(length) = parse_length(length) else {
            return Response::Err;
        };
        if length == 0 || length >= value.len() {
            return Response::value(value);
        }
        Response::value(value.slice(..length))
    }

    fn handle_host(&self, id: &[u8], addr: &[u8]) -> Response {
        if id.is_empty() || addr.is_empty() || id == self.identity.as_bytes() {
            return Response::Empty;
        }
        match self.peers.admit(id, addr) {
            Ok(true) => tracing::info!(
                peer = %String::from_utf8_lossy(id),
                addr = %String::from_utf8_lossy(addr),
                "peer admitted"
            ),
            Ok(false) => {
                tracing::trace!(peer = %String::from_utf8_lossy(id), "peer refreshed")
            }
            Err(e) => tracing::debug!(error = %e, "peer registry unavailable"),
        }
        Response::Empty
    }

    fn handle_check(&self) -> Response {
        self.replicate("nop", b"", b"");
        Response::Ack
    }

    fn replicate(&self, command: &str, key: &[u8], value: &[u8]) -> FanOutReport {
        let report = self.replicator.fan_out(command, key, value);
        if report.evicted > 0 {
            tracing::debug!(
                command,
                delivered = report.delivered,
                evicted = report.evicted,
                "fan-out finished with evictions"
            );
        }
        report
    }

    /// Stop the store and registry workers
    ///
    /// Sessions still running afterwards get `err` replies.
    pub fn close(&self) {
        self.store.close();
        self.peers.close();
        tracing::info!("engine closed");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Non-negative decimal length
fn parse_length(raw: &[u8]) -> Option<usize> {
    if raw.is_empty() || raw.len() > 9 || !raw.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(raw).ok()?.parse().ok()
}
