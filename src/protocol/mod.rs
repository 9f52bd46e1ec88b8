//! Protocol Module
//!
//! Defines the streaming wire protocol shared by clients, peers and discovery.
//!
//! ## Message Format
//! ```text
//! ┌───────────┬────────────┬──────────────┬─────────────┬─── (arg2 likewise)
//! │ Cmd (3)   │ LenLen (1) │ Len (LenLen) │ Body (Len)  │
//! └───────────┴────────────┴──────────────┴─────────────┴───
//! ```
//!
//! `LenLen` is one decimal digit giving the number of decimal digits in `Len`.
//! A grammar entry may mark an argument as *literal*: its `Len` digits are the
//! argument itself and no body follows.
//!
//! ### Example
//! ```text
//! put13key15value   → put("key", "value")
//! hed13key210       → hed("key", "10")   (arg2 is literal)
//! ```
//!
//! ### Replies
//! - `ack`, `nil`, `err`: bare three-byte tokens
//! - `val` + one framed argument: a value
//! - nothing at all (peer heartbeats)

mod codec;
mod command;
mod grammar;
mod parser;
mod response;

pub use codec::{create_data, COMMAND_LEN, MAX_ARG_SIZE};
pub use command::Command;
pub use grammar::{Grammar, GrammarEntry};
pub use parser::{Message, Parser, Stage};
pub use response::Response;
