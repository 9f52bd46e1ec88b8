//! Response definitions
//!
//! Represents replies written back to clients and peers.

use bytes::{BufMut, Bytes, BytesMut};

use super::codec::{put_frame, MAX_ARG_SIZE};
use super::parser::Message;
use crate::error::{HiveError, Result};

/// A reply to send back over the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ack,
    Nil,
    Err,
    /// A framed value
    Val(Bytes),
    /// Nothing is written
    Empty,
}

impl Response {
    /// A value reply, or `Err` if the value cannot be framed
    ///
    /// Frames carry 1..=`MAX_ARG_SIZE` bytes, so an empty value has no encoding
    /// a client could decode.
    pub fn value(value: impl Into<Bytes>) -> Self {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_ARG_SIZE {
            return Response::Err;
        }
        Response::Val(value)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Empty)
    }

    /// The three-byte token this reply starts with
    pub fn token(&self) -> &'static str {
        match self {
            Response::Ack => "ack",
            Response::Nil => "nil",
            Response::Err => "err",
            Response::Val(_) => "val",
            Response::Empty => "",
        }
    }

    /// Wire encoding
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Response::Val(value) => {
                let mut message = BytesMut::with_capacity(3 + 10 + value.len());
                message.put_slice(b"val");
                if value.is_empty() || put_frame(&mut message, value).is_err() {
                    // Response::value keeps unframeable payloads out of Val
                    return Bytes::from_static(b"err");
                }
                message.freeze()
            }
            other => Bytes::from_static(other.token().as_bytes()),
        }
    }

    /// Rebuild a reply decoded with [`super::Grammar::responses`]
    pub fn from_message(message: Message) -> Result<Self> {
        match message.command.as_str() {
            "ack" => Ok(Response::Ack),
            "nil" => Ok(Response::Nil),
            "err" => Ok(Response::Err),
            "val" => Ok(Response::Val(message.arg1)),
            other => Err(HiveError::UnknownCommand(other.to_string())),
        }
    }
}
