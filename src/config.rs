//! Configuration for HiveKV
//!
//! Centralized configuration with sensible defaults.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::error::{HiveError, Result};

/// Main configuration for a HiveKV node
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Client Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Size of the per-connection read buffer (bytes)
    pub read_buffer_size: usize,

    /// Connection read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Cluster Configuration
    // -------------------------------------------------------------------------
    /// Identity announced to peers. Derived from host and process ids when unset.
    pub node_id: Option<String>,

    /// Dial address announced to peers. Derived from the bound listener when unset.
    pub advertise_addr: Option<String>,

    /// Run the UDP discovery listener and broadcaster
    pub discovery_enabled: bool,

    /// UDP port used for discovery (listen and broadcast)
    pub discovery_port: u16,

    /// Subnet broadcast host discovery datagrams are sent to
    pub broadcast_addr: String,

    /// Interval between discovery broadcasts (milliseconds)
    pub broadcast_interval_ms: u64,

    /// Interval between liveness probes of known peers (milliseconds)
    pub check_interval_ms: u64,

    /// Deadline for dialing, writing to and hearing back from a peer (milliseconds)
    pub replication_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            read_buffer_size: 256,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            node_id: None,
            advertise_addr: None,
            discovery_enabled: true,
            discovery_port: 9000,
            broadcast_addr: "255.255.255.255".to_string(),
            broadcast_interval_ms: 3000,
            check_interval_ms: 5000,
            replication_timeout_ms: 800,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Deadline applied to each step of a peer fan-out
    pub fn replication_timeout(&self) -> Duration {
        Duration::from_millis(self.replication_timeout_ms)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Resolve the broadcast target for discovery datagrams
    pub fn broadcast_target(&self) -> Result<SocketAddr> {
        let target = format!("{}:{}", self.broadcast_addr, self.discovery_port);
        target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                HiveError::Config(format!("cannot resolve broadcast address {}", target))
            })
    }

    /// Check values that would otherwise fail deep inside a worker thread
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(HiveError::Config("read_buffer_size must be positive".to_string()));
        }
        if self.replication_timeout_ms == 0 {
            return Err(HiveError::Config(
                "replication_timeout_ms must be positive".to_string(),
            ));
        }
        if self.check_interval_ms == 0 {
            return Err(HiveError::Config("check_interval_ms must be positive".to_string()));
        }
        if self.discovery_enabled && self.broadcast_interval_ms == 0 {
            return Err(HiveError::Config(
                "broadcast_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the per-connection read buffer size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Override the node identity
    pub fn node_id(mut self, id: impl Into<String>) -> Self {
        self.config.node_id = Some(id.into());
        self
    }

    /// Override the dial address announced to peers
    pub fn advertise_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.advertise_addr = Some(addr.into());
        self
    }

    /// Enable or disable UDP discovery
    pub fn discovery_enabled(mut self, enabled: bool) -> Self {
        self.config.discovery_enabled = enabled;
        self
    }

    /// Set the UDP discovery port
    pub fn discovery_port(mut self, port: u16) -> Self {
        self.config.discovery_port = port;
        self
    }

    /// Set the broadcast host (without port)
    pub fn broadcast_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.broadcast_addr = addr.into();
        self
    }

    /// Set the discovery broadcast interval (in milliseconds)
    pub fn broadcast_interval_ms(mut self, ms: u64) -> Self {
        self.config.broadcast_interval_ms = ms;
        self
    }

    /// Set the liveness check interval (in milliseconds)
    pub fn check_interval_ms(mut self, ms: u64) -> Self {
        self.config.check_interval_ms = ms;
        self
    }

    /// Set the per-peer replication deadline (in milliseconds)
    pub fn replication_timeout_ms(mut self, ms: u64) -> Self {
        self.config.replication_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
