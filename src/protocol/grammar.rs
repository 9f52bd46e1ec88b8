//! Grammar definitions
//!
//! Maps each three-byte command token to its argument framing.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};

use super::codec::{put_frame, put_literal, COMMAND_LEN};
use crate::error::{HiveError, Result};

type Token = [u8; COMMAND_LEN];

/// Framing rule for one command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrammarEntry {
    /// Number of arguments that follow the token (0, 1 or 2)
    pub expected_args: u8,

    /// Arg1's length field is the argument itself
    pub arg1_literal: bool,

    /// Arg2's length field is the argument itself
    pub arg2_literal: bool,
}

impl GrammarEntry {
    pub const fn args(expected_args: u8) -> Self {
        Self {
            expected_args,
            arg1_literal: false,
            arg2_literal: false,
        }
    }

    pub const fn arg1_literal(mut self) -> Self {
        self.arg1_literal = true;
        self
    }

    pub const fn arg2_literal(mut self) -> Self {
        self.arg2_literal = true;
        self
    }

    /// Literal flag for the 1-based argument `index`
    pub fn is_literal(&self, index: u8) -> bool {
        match index {
            1 => self.arg1_literal,
            2 => self.arg2_literal,
            _ => false,
        }
    }
}

/// Immutable command table consulted by every parser
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    entries: HashMap<Token, GrammarEntry>,
}

impl Grammar {
    /// An empty grammar (every token is unknown)
    pub fn new() -> Self {
        Self::default()
    }

    /// The node's request grammar
    pub fn standard() -> Self {
        Self::from_entries([
            (*b"put", GrammarEntry::args(2)),
            (*b"get", GrammarEntry::args(1)),
            (*b"del", GrammarEntry::args(1)),
            (*b"hed", GrammarEntry::args(2).arg2_literal()),
            (*b"spt", GrammarEntry::args(2)),
            (*b"sdl", GrammarEntry::args(1)),
            (*b"sgt", GrammarEntry::args(1)),
            (*b"chk", GrammarEntry::args(1)),
            (*b"hst", GrammarEntry::args(2)),
            (*b"nop", GrammarEntry::args(0)),
            (*b"bye", GrammarEntry::args(0)),
            (*b"die", GrammarEntry::args(0)),
        ])
    }

    /// Grammar for decoding the node's replies on the client side
    pub fn responses() -> Self {
        Self::from_entries([
            (*b"ack", GrammarEntry::args(0)),
            (*b"nil", GrammarEntry::args(0)),
            (*b"err", GrammarEntry::args(0)),
            (*b"val", GrammarEntry::args(1)),
        ])
    }

    fn from_entries<const N: usize>(entries: [(Token, GrammarEntry); N]) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Add or replace the rule for `token`
    pub fn insert(&mut self, token: &str, entry: GrammarEntry) -> Result<()> {
        let key: Token = token.as_bytes().try_into().map_err(|_| {
            HiveError::InvalidArgument(format!(
                "command token must be {} bytes, got {:?}",
                COMMAND_LEN, token
            ))
        })?;
        if entry.expected_args > 2 {
            return Err(HiveError::InvalidArgument(format!(
                "{}: at most 2 arguments, got {}",
                token, entry.expected_args
            )));
        }
        if (entry.arg1_literal && entry.expected_args < 1)
            || (entry.arg2_literal && entry.expected_args < 2)
        {
            return Err(HiveError::InvalidArgument(format!(
                "{}: literal flag set on a missing argument",
                token
            )));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Builder-style [`Grammar::insert`]
    pub fn with(mut self, token: &str, entry: GrammarEntry) -> Result<Self> {
        self.insert(token, entry)?;
        Ok(self)
    }

    pub fn lookup(&self, token: &[u8]) -> Option<GrammarEntry> {
        let key: Token = token.try_into().ok()?;
        self.entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode a message honoring this grammar's literal-value flags
    ///
    /// Unlike [`super::create_data`], the argument count must match the entry and
    /// literal arguments are written as bare digits.
    pub fn encode(&self, command: &str, arg1: &[u8], arg2: &[u8]) -> Result<Bytes> {
        let entry = self
            .lookup(command.as_bytes())
            .ok_or_else(|| HiveError::UnknownCommand(command.to_string()))?;

        let args = [arg1, arg2];
        let supplied = args.iter().filter(|a| !a.is_empty()).count();
        let expected = entry.expected_args as usize;
        if supplied != expected || args[..expected].iter().any(|a| a.is_empty()) {
            return Err(HiveError::InvalidArgument(format!(
                "{} expects {} non-empty argument(s)",
                command, expected
            )));
        }

        let mut message = BytesMut::with_capacity(COMMAND_LEN + 20 + arg1.len() + arg2.len());
        message.put_slice(command.as_bytes());
        for (index, arg) in args[..expected].iter().enumerate() {
            if entry.is_literal(index as u8 + 1) {
                put_literal(&mut message, arg)?;
            } else {
                put_frame(&mut message, arg)?;
            }
        }
        Ok(message.freeze())
    }
}
