//! Incremental message parser
//!
//! Fed one byte at a time so a message may straddle any number of socket reads.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use super::codec::{COMMAND_LEN, MAX_ARG_SIZE};
use super::grammar::{Grammar, GrammarEntry};
use crate::error::{HiveError, Result};

/// Where the parser is within the current message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Command,
    Arg1LengthLength,
    Arg1Length,
    Arg1,
    Arg2LengthLength,
    Arg2Length,
    Arg2,
    /// A complete message is waiting for [`Parser::get_message`]
    Ready,
}

/// A fully decoded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub command: String,
    pub arg1: Bytes,
    pub arg2: Bytes,
}

impl Message {
    pub fn new(
        command: impl Into<String>,
        arg1: impl Into<Bytes>,
        arg2: impl Into<Bytes>,
    ) -> Self {
        Self {
            command: command.into(),
            arg1: arg1.into(),
            arg2: arg2.into(),
        }
    }
}

/// Per-connection decoder state
///
/// Never shared between connections. Errors reset the parser so the next byte
/// starts a fresh message.
pub struct Parser {
    grammar: Arc<Grammar>,
    stage: Stage,
    command: Vec<u8>,
    entry: GrammarEntry,
    /// Digits expected in the current length field
    length_length: usize,
    length_digits: Vec<u8>,
    /// Body bytes expected for the current argument
    length: usize,
    arg1: BytesMut,
    arg2: BytesMut,
}

impl Parser {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            stage: Stage::Command,
            command: Vec::with_capacity(COMMAND_LEN),
            entry: GrammarEntry::default(),
            length_length: 0,
            length_digits: Vec::with_capacity(9),
            length: 0,
            arg1: BytesMut::new(),
            arg2: BytesMut::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_ready(&self) -> bool {
        self.stage == Stage::Ready
    }

    /// Consume one byte
    ///
    /// Returns `Ok(true)` when this byte completed a message. Bytes arriving
    /// while a message is ready are ignored.
    pub fn process(&mut self, byte: u8) -> Result<bool> {
        match self.stage {
            Stage::Command => {
                self.command.push(byte);
                if self.command.len() < COMMAND_LEN {
                    return Ok(false);
                }
                let Some(entry) = self.grammar.lookup(&self.command) else {
                    let token = String::from_utf8_lossy(&self.command).into_owned();
                    self.reset();
                    return Err(HiveError::UnknownCommand(token));
                };
                if entry.expected_args == 0 {
                    self.stage = Stage::Ready;
                    return Ok(true);
                }
                self.entry = entry;
                self.stage = Stage::Arg1LengthLength;
            }
            Stage::Arg1LengthLength | Stage::Arg2LengthLength => {
                let n = match byte {
                    b'1'..=b'9' => (byte - b'0') as usize,
                    _ => {
                        return self.fail(format!(
                            "length-of-length {:?} is not 1-9",
                            byte as char
                        ))
                    }
                };
                self.length_length = n;
                self.length_digits.clear();
                self.stage = if self.stage == Stage::Arg1LengthLength {
                    Stage::Arg1Length
                } else {
                    Stage::Arg2Length
                };
            }
            Stage::Arg1Length | Stage::Arg2Length => {
                if !byte.is_ascii_digit() {
                    return self.fail(format!(
                        "length digit {:?} is not numeric",
                        byte as char
                    ));
                }
                self.length_digits.push(byte);
                if self.length_digits.len() == self.length_length {
                    return self.finish_length();
                }
            }
            Stage::Arg1 => {
                self.arg1.extend_from_slice(&[byte]);
                if self.arg1.len() == self.length {
                    return Ok(self.finish_arg(1));
                }
            }
            Stage::Arg2 => {
                self.arg2.extend_from_slice(&[byte]);
                if self.arg2.len() == self.length {
                    return Ok(self.finish_arg(2));
                }
            }
            Stage::Ready => {}
        }
        Ok(false)
    }

    /// Take the ready message and reset for the next one
    pub fn get_message(&mut self) -> Result<Message> {
        if self.stage != Stage::Ready {
            return Err(HiveError::NoMessage);
        }
        let message = Message {
            command: String::from_utf8_lossy(&self.command).into_owned(),
            arg1: self.arg1.split().freeze(),
            arg2: self.arg2.split().freeze(),
        };
        self.reset();
        Ok(message)
    }

    fn finish_length(&mut self) -> Result<bool> {
        let index = if self.stage == Stage::Arg1Length { 1 } else { 2 };

        // At most 9 digits, so this cannot overflow
        let value = self
            .length_digits
            .iter()
            .fold(0usize, |acc, d| acc * 10 + (d - b'0') as usize);

        if self.entry.is_literal(index) {
            let target = if index == 1 { &mut self.arg1 } else { &mut self.arg2 };
            target.extend_from_slice(&self.length_digits);
            return Ok(self.finish_arg(index));
        }

        if value == 0 || value > MAX_ARG_SIZE {
            let digits = String::from_utf8_lossy(&self.length_digits).into_owned();
            return self.fail(format!("argument length {} out of range", digits));
        }
        self.length = value;
        let target = if index == 1 { &mut self.arg1 } else { &mut self.arg2 };
        target.reserve(value.min(4096));
        self.stage = if index == 1 { Stage::Arg1 } else { Stage::Arg2 };
        Ok(false)
    }

    fn finish_arg(&mut self, index: u8) -> bool {
        if index >= self.entry.expected_args {
            self.stage = Stage::Ready;
            return true;
        }
        self.stage = Stage::Arg2LengthLength;
        false
    }

    fn fail(&mut self, reason: String) -> Result<bool> {
        self.reset();
        Err(HiveError::BadFormat(reason))
    }

    fn reset(&mut self) {
        self.stage = Stage::Command;
        self.command.clear();
        self.entry = GrammarEntry::default();
        self.length_length = 0;
        self.length_digits.clear();
        self.length = 0;
        self.arg1.clear();
        self.arg2.clear();
    }
}
