//! Node shutdown signal
//!
//! One-shot notification: `trigger` closes a crossbeam channel, which every
//! receiver observes as disconnection. The node's main thread is the waiter;
//! timer threads also watch it so they stop ticking.

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

pub struct Shutdown {
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            trigger: Mutex::new(Some(trigger)),
            signal,
        }
    }

    /// Fire the signal. Later calls are no-ops.
    pub fn trigger(&self) {
        if self.trigger.lock().take().is_some() {
            tracing::info!("shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.trigger.lock().is_none()
    }

    /// Block until the signal fires
    pub fn wait(&self) {
        // Nothing is ever sent: recv returns only on disconnection
        let _ = self.signal.recv();
    }

    /// Receiver for use in `select!`; becomes ready once triggered
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
