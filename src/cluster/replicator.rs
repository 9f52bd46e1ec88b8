//! Replication fan-out
//!
//! Sends one encoded command to every known peer, sequentially, evicting any
//! peer that cannot be dialed, written to, or does not answer in time.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{HiveError, Result};
use crate::protocol::create_data;

use super::registry::{Peer, PeerRegistry};

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub evicted: usize,
}

pub struct Replicator {
    peers: Arc<PeerRegistry>,

    /// Deadline for each of dial, write and acknowledgement
    timeout: Duration,
}

impl Replicator {
    pub fn new(peers: Arc<PeerRegistry>, timeout: Duration) -> Self {
        Self { peers, timeout }
    }

    /// Relay `command` to all peers
    ///
    /// Worst case costs one timeout per peer per step; there is no parallelism.
    pub fn fan_out(&self, command: &str, key: &[u8], value: &[u8]) -> FanOutReport {
        let mut report = FanOutReport::default();

        let data = match create_data(command, key, value) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(command, error = %e, "cannot encode replication message");
                return report;
            }
        };

        let peers = match self.peers.peers() {
            Ok(peers) => peers,
            Err(e) => {
                tracing::debug!(error = %e, "peer registry unavailable, skipping fan-out");
                return report;
            }
        };

        for peer in peers {
            match self.deliver(&peer, &data) {
                Ok(()) => {
                    tracing::debug!(command, peer = %peer.display_id(), "replicated");
                    report.delivered += 1;
                }
                Err(e) => {
                    tracing::info!(
                        peer = %peer.display_id(),
                        addr = %peer.addr,
                        error = %e,
                        "removing unreachable peer"
                    );
                    if let Err(e) = self.peers.evict(&peer.id) {
                        tracing::debug!(error = %e, "peer eviction failed");
                    }
                    report.evicted += 1;
                }
            }
        }

        report
    }

    /// Dial, write, and wait for any reply
    fn deliver(&self, peer: &Peer, data: &[u8]) -> Result<()> {
        let target = peer
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| HiveError::Network(format!("cannot resolve {}", peer.addr)))?;

        let mut stream = TcpStream::connect_timeout(&target, self.timeout)?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.write_all(data)?;

        let mut ack = [0u8; 16];
        match stream.read(&mut ack)? {
            0 => Err(HiveError::Network(
                "peer closed the connection without acknowledging".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
