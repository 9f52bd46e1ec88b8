//! Store Module
//!
//! In-memory key/value table owned by a single worker thread.
//!
//! ## Responsibilities
//! - Serialize every read and write through one mailbox
//! - Give each caller a private reply channel
//! - Lazy start (`open`) and explicit teardown (`close`)
//!
//! ## Concurrency Model
//! ```text
//!   caller ──┐
//!   caller ──┼──► requests (crossbeam) ──► worker thread ──► HashMap
//!   caller ──┘           ▲                       │
//!                        └──── reply (bounded 1) ┘
//! ```
//!
//! The same type backs both the data table and the cluster's peer registry.

mod table;

pub use table::KvStore;
