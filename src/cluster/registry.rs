//! Peer registry
//!
//! A second [`KvStore`] instance: peer identity → TCP dial address.

use bytes::Bytes;

use crate::error::{HiveError, Result};
use crate::store::KvStore;

/// A known peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: Bytes,
    pub addr: String,
}

impl Peer {
    /// Identity for log lines
    pub fn display_id(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }
}

pub struct PeerRegistry {
    store: KvStore,
}

impl PeerRegistry {
    /// Open an empty registry
    pub fn open() -> Result<Self> {
        Ok(Self {
            store: KvStore::open_new("peers")?,
        })
    }

    /// Record or refresh a peer. Returns `true` if it was new or moved.
    pub fn admit(&self, id: &[u8], addr: &[u8]) -> Result<bool> {
        self.store.upsert(id, addr)
    }

    /// Forget a peer
    pub fn evict(&self, id: &[u8]) -> Result<()> {
        self.store.delete(id)
    }

    pub fn address(&self, id: &[u8]) -> Result<String> {
        let addr = self.store.get(id)?;
        Ok(String::from_utf8_lossy(&addr).into_owned())
    }

    pub fn contains(&self, id: &[u8]) -> Result<bool> {
        match self.store.get(id) {
            Ok(_) => Ok(true),
            Err(HiveError::KeyNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Snapshot of known peers
    ///
    /// Peers evicted between listing and lookup are skipped.
    pub fn peers(&self) -> Result<Vec<Peer>> {
        let mut peers = Vec::new();
        for id in self.store.list_keys()? {
            match self.address(&id) {
                Ok(addr) => peers.push(Peer { id, addr }),
                Err(HiveError::KeyNotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(peers)
    }

    pub fn close(&self) {
        self.store.close();
    }
}
