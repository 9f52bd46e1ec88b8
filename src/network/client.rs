//! TCP client
//!
//! Speaks the node protocol from the outside: used by the CLI and tests.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{HiveError, Result};
use crate::protocol::{Grammar, Parser, Response};

pub struct Client {
    stream: TcpStream,
    requests: Grammar,
    replies: Parser,
    /// Bytes read past the end of the last reply
    pending: BytesMut,
}

impl Client {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            requests: Grammar::standard(),
            replies: Parser::new(Arc::new(Grammar::responses())),
            pending: BytesMut::new(),
        })
    }

    /// Bound how long a reply may take
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        self.stream.set_write_timeout(timeout)?;
        Ok(())
    }

    /// Send one request and wait for its reply
    ///
    /// `bye` and `hst` get no reply; they return `Response::Empty` right away.
    pub fn request(&mut self, command: &str, arg1: &[u8], arg2: &[u8]) -> Result<Response> {
        let data = self.requests.encode(command, arg1, arg2)?;
        self.send_raw(&data)?;
        if matches!(command, "bye" | "hst") {
            return Ok(Response::Empty);
        }
        self.read_response()
    }

    /// Write bytes as-is
    pub fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Read exactly one reply
    pub fn read_response(&mut self) -> Result<Response> {
        let mut buffer = [0u8; 256];
        loop {
            while self.pending.has_remaining() {
                let byte = self.pending.get_u8();
                if self.replies.process(byte)? {
                    return Response::from_message(self.replies.get_message()?);
                }
            }

            let count = match self.stream.read(&mut buffer) {
                Ok(0) => {
                    return Err(HiveError::Network(
                        "connection closed before a reply arrived".to_string(),
                    ))
                }
                Ok(count) => count,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.pending.extend_from_slice(&buffer[..count]);
        }
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        match self.request("get", key, b"")? {
            Response::Val(value) => Ok(Some(value)),
            Response::Nil => Ok(None),
            other => Err(unexpected("get", &other)),
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.expect_ack("put", key, value)
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.expect_ack("del", key, b"")
    }

    /// First `length` bytes of a value (`0` for all of it)
    pub fn head(&mut self, key: &[u8], length: usize) -> Result<Option<Bytes>> {
        match self.request("hed", key, length.to_string().as_bytes())? {
            Response::Val(value) => Ok(Some(value)),
            Response::Nil => Ok(None),
            other => Err(unexpected("hed", &other)),
        }
    }

    pub fn nop(&mut self) -> Result<()> {
        self.expect_ack("nop", b"", b"")
    }

    /// Politely end the session
    pub fn bye(mut self) -> Result<()> {
        self.request("bye", b"", b"")?;
        Ok(())
    }

    /// Ask the node to shut down
    pub fn die(mut self) -> Result<()> {
        self.expect_ack("die", b"", b"")
    }

    fn expect_ack(&mut self, command: &str, arg1: &[u8], arg2: &[u8]) -> Result<()> {
        match self.request(command, arg1, arg2)? {
            Response::Ack => Ok(()),
            other => Err(unexpected(command, &other)),
        }
    }
}

fn unexpected(command: &str, response: &Response) -> HiveError {
    HiveError::Network(format!("{} answered {:?}", command, response))
}
