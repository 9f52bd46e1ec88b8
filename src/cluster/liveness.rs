//! Liveness probing
//!
//! Feeds an internal `chk` to the dispatcher on a timer so stale peers are
//! pruned through the normal fan-out eviction path.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::tick;
use crossbeam::select;

use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::Message;

pub fn spawn_liveness(engine: Arc<Engine>, interval: Duration) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("liveness".to_string())
        .spawn(move || {
            let ticker = tick(interval);
            let probe = Message::new("chk", "", "");
            loop {
                select! {
                    recv(ticker) -> _ => {
                        engine.execute(&probe);
                    }
                    recv(engine.shutdown().signal()) -> _ => break,
                }
            }
            tracing::debug!("liveness checker stopped");
        })?;
    Ok(handle)
}
