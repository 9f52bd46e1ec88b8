//! UDP discovery
//!
//! Nodes announce themselves with `hst <identity> <dial address>` datagrams sent
//! to the subnet broadcast address, and admit whatever announcements they hear.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::tick;
use crossbeam::select;
use socket2::{Domain, Protocol, Socket, Type};

use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{create_data, Grammar, Message, Parser};

/// Datagram buffer; announcements are far smaller
const DATAGRAM_SIZE: usize = 2048;

/// How often the listener wakes to check for shutdown
const LISTEN_POLL: Duration = Duration::from_millis(500);

/// Periodically broadcast this node's announcement until shutdown
pub fn spawn_broadcaster(
    engine: Arc<Engine>,
    socket: UdpSocket,
    target: SocketAddr,
    advertise_addr: String,
    interval: Duration,
) -> Result<JoinHandle<()>> {
    let announcement = create_data(
        "hst",
        engine.identity().as_bytes(),
        advertise_addr.as_bytes(),
    )?;
    socket.set_broadcast(true)?;

    let handle = thread::Builder::new()
        .name("discovery-broadcast".to_string())
        .spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => broadcast(&socket, target, &announcement),
                    recv(engine.shutdown().signal()) -> _ => break,
                }
            }
            tracing::debug!("discovery broadcaster stopped");
        })?;
    Ok(handle)
}

fn broadcast(socket: &UdpSocket, target: SocketAddr, announcement: &Bytes) {
    match socket.send_to(announcement, target) {
        Ok(_) => tracing::trace!(%target, "discovery broadcast"),
        Err(e) => tracing::debug!(%target, error = %e, "discovery broadcast failed"),
    }
}

/// Listen for announcements until shutdown
pub fn spawn_listener(
    engine: Arc<Engine>,
    grammar: Arc<Grammar>,
    socket: UdpSocket,
) -> Result<JoinHandle<()>> {
    socket.set_broadcast(true)?;
    socket.set_read_timeout(Some(LISTEN_POLL))?;

    let handle = thread::Builder::new()
        .name("discovery-listen".to_string())
        .spawn(move || {
            let mut buffer = vec![0u8; DATAGRAM_SIZE];
            while !engine.shutdown().is_triggered() {
                match socket.recv_from(&mut buffer) {
                    Ok((0, _)) => continue,
                    Ok((n, source)) => {
                        handle_datagram(&engine, &grammar, &buffer[..n], source)
                    }
                    Err(e) if is_poll_timeout(&e) => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "discovery listener failed");
                        break;
                    }
                }
            }
            tracing::debug!("discovery listener stopped");
        })?;
    Ok(handle)
}

fn is_poll_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Bind the shared discovery port
///
/// Every node on a host listens on the same port, so the socket is marked for
/// address reuse (and port reuse on unix) before binding.
pub fn bind_discovery_socket(port: u16) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;
    socket.set_broadcast(true)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

/// Decode one datagram and admit the announcing peer
///
/// Only the first complete message counts; anything other than `hst` is
/// dropped so datagrams cannot mutate data or stop the node.
pub fn handle_datagram(
    engine: &Engine,
    grammar: &Arc<Grammar>,
    datagram: &[u8],
    source: SocketAddr,
) {
    let mut parser = Parser::new(Arc::clone(grammar));
    let mut found = false;
    for &byte in datagram {
        match parser.process(byte) {
            Ok(true) => {
                found = true;
                break;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::trace!(%source, error = %e, "ignoring malformed datagram");
                return;
            }
        }
    }
    if !found {
        return;
    }
    let Ok(message) = parser.get_message() else {
        return;
    };

    if message.command != "hst" {
        tracing::debug!(
            %source,
            command = %message.command,
            "ignoring non-discovery datagram"
        );
        return;
    }
    if message.arg1 == engine.identity().as_bytes() {
        return;
    }

    let addr = resolve_announced(&message.arg2, source.ip());
    engine.execute(&Message::new("hst", message.arg1, addr));
}

/// Fill an unspecified host (`0.0.0.0:port`) with the datagram's source address
fn resolve_announced(announced: &[u8], source: IpAddr) -> Bytes {
    let parsed = std::str::from_utf8(announced)
        .ok()
        .and_then(|s| s.parse::<SocketAddr>().ok());
    match parsed {
        Some(addr) if addr.ip().is_unspecified() => {
            Bytes::from(SocketAddr::new(source, addr.port()).to_string())
        }
        _ => Bytes::copy_from_slice(announced),
    }
}
