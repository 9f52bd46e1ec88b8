//! KvStore implementation
//!
//! HashMap owned by a worker thread, reached through a crossbeam mailbox.

use std::collections::HashMap;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{HiveError, Result};

/// A request descriptor handed to the worker
enum Request {
    Get {
        key: Bytes,
        reply: Sender<Result<Bytes>>,
    },
    Upsert {
        key: Bytes,
        value: Bytes,
        reply: Sender<Result<bool>>,
    },
    Delete {
        key: Bytes,
        reply: Sender<Result<()>>,
    },
    ListKeys {
        reply: Sender<Result<Vec<Bytes>>>,
    },
}

/// Handle to a running worker
struct Worker {
    requests: Sender<Request>,
    handle: JoinHandle<()>,
}

/// Serialized in-memory key/value table
///
/// Only the worker thread touches the table. Callers block on their own reply.
pub struct KvStore {
    /// Label used for the worker thread and log lines
    name: String,

    /// `None` until opened and after close
    worker: Mutex<Option<Worker>>,
}

impl KvStore {
    /// Create a closed store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worker: Mutex::new(None),
        }
    }

    /// Create and open a store
    pub fn open_new(name: impl Into<String>) -> Result<Self> {
        let store = Self::new(name);
        store.open()?;
        Ok(store)
    }

    /// Allocate the table and start the worker. No-op if already open.
    pub fn open(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let (requests, inbox) = unbounded();
        let name = self.name.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-store", self.name))
            .spawn(move || run_worker(&name, inbox))?;

        tracing::debug!(store = %self.name, "store opened");
        *worker = Some(Worker { requests, handle });
        Ok(())
    }

    /// Stop the worker and drop the table
    ///
    /// Callers must quiesce first: requests racing with close fail with
    /// `StoreClosed`.
    pub fn close(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        // Dropping the last sender ends the worker loop
        drop(worker.requests);
        if worker.handle.join().is_err() {
            tracing::warn!(store = %self.name, "store worker panicked");
        }
        tracing::debug!(store = %self.name, "store closed");
    }

    pub fn is_open(&self) -> bool {
        self.worker.lock().is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        let key = Bytes::copy_from_slice(key);
        self.submit(|reply| Request::Get { key, reply })
    }

    /// Insert or overwrite. Returns `false` when the stored value was already identical.
    pub fn upsert(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let key = Bytes::copy_from_slice(key);
        let value = Bytes::copy_from_slice(value);
        self.submit(|reply| Request::Upsert { key, value, reply })
    }

    /// Remove a key. Absent keys are not an error.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let key = Bytes::copy_from_slice(key);
        self.submit(|reply| Request::Delete { key, reply })
    }

    /// Snapshot of all keys, in no particular order
    pub fn list_keys(&self) -> Result<Vec<Bytes>> {
        self.submit(|reply| Request::ListKeys { reply })
    }

    fn submit<T>(&self, build: impl FnOnce(Sender<Result<T>>) -> Request) -> Result<T> {
        let requests = self
            .worker
            .lock()
            .as_ref()
            .map(|w| w.requests.clone())
            .ok_or(HiveError::StoreClosed)?;

        let (reply, response) = bounded(1);
        requests
            .send(build(reply))
            .map_err(|_| HiveError::StoreClosed)?;
        response.recv().map_err(|_| HiveError::StoreClosed)?
    }
}

impl Drop for KvStore {
    fn drop(&mut self) {
        self.close();
    }
}

/// Worker loop: the only code that touches the table
fn run_worker(name: &str, inbox: Receiver<Request>) {
    let mut items: HashMap<Bytes, Bytes> = HashMap::new();

    for request in inbox {
        // A dropped reply receiver just means the caller went away
        match request {
            Request::Get { key, reply } => {
                let result = items.get(&key).cloned().ok_or(HiveError::KeyNotFound);
                tracing::trace!(
                    store = name,
                    op = "get",
                    key_len = key.len(),
                    found = result.is_ok()
                );
                let _ = reply.send(result);
            }
            Request::Upsert { key, value, reply } => {
                let changed = match items.get(&key) {
                    Some(previous) if *previous == value => false,
                    _ => {
                        items.insert(key.clone(), value);
                        true
                    }
                };
                tracing::trace!(store = name, op = "upsert", key_len = key.len(), changed);
                let _ = reply.send(Ok(changed));
            }
            Request::Delete { key, reply } => {
                let existed = items.remove(&key).is_some();
                tracing::trace!(store = name, op = "delete", key_len = key.len(), existed);
                let _ = reply.send(Ok(()));
            }
            Request::ListKeys { reply } => {
                let _ = reply.send(Ok(items.keys().cloned().collect()));
            }
        }
    }
}
