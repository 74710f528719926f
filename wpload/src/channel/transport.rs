//! Datagram transport abstraction for testability.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;

use parking_lot::Mutex;

/// One-way datagram transport.
///
/// Implementations report how many bytes were handed to the network; there is
/// no delivery acknowledgement.
pub trait Transport: Send {
    /// Sends one datagram, returning the number of bytes accepted.
    fn send(&self, datagram: &[u8]) -> io::Result<usize>;
}

/// UDP transport to the simulator's import port.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Default DCS-BIOS import port.
    pub const DEFAULT_PORT: u16 = 7778;

    /// Opens an unconnected socket that sends to `host:port`.
    pub fn open(host: &str, port: u16) -> io::Result<Self> {
        let target = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{}:{} did not resolve", host, port),
            )
        })?;
        let bind: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        Ok(Self { socket, target })
    }
}

impl Transport for UdpTransport {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send_to(datagram, self.target)
    }
}

/// Transport that keeps every datagram instead of sending it.
///
/// Clones share the same log, so a caller can keep one handle while the
/// channel owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every datagram sent so far, without the trailing newline.
    pub fn datagrams(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Control ids of every press, in order.
    ///
    /// A press is a `"<ID> 1"` datagram immediately followed by `"<ID> 0"`;
    /// switch positions and raw tokens are left out.
    pub fn presses(&self) -> Vec<String> {
        self.log
            .lock()
            .windows(2)
            .filter_map(|pair| {
                let control = pair[0].strip_suffix(" 1")?;
                let released = pair[1].strip_suffix(" 0")?;
                (control == released).then(|| control.to_string())
            })
            .collect()
    }

    /// Number of datagrams sent so far.
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Transport for RecordingTransport {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(datagram);
        self.log
            .lock()
            .push(text.trim_end_matches('\n').to_string());
        Ok(datagram.len())
    }
}
