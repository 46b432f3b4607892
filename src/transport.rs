//! Unreliable datagram transport
//!
//! The [`Transport`] trait is the node's only view of the network: an
//! unreliable `send_to` / `recv_from` pair. The node treats every send as
//! fire-and-forget — a failed send is indistinguishable from a lost datagram
//! and is recovered by retransmission, never reported upward. The default
//! [`UdpTransport`] is backed by `tokio::net::UdpSocket`.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;

/// Boxed future returned by [`Transport::send_to`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = io::Result<usize>> + Send + 'a>>;

/// Boxed future returned by [`Transport::recv_from`].
pub type RecvFuture<'a> =
    Pin<Box<dyn Future<Output = io::Result<(usize, SocketAddr)>> + Send + 'a>>;

/// Async datagram transport used by the node.
///
/// Object-safe so it can be shared as `Arc<dyn Transport>` between the
/// listener task and the engine actor.
pub trait Transport: Send + Sync + 'static {
    /// Send `buf` to `target`, returning the number of bytes written.
    fn send_to<'a>(&'a self, buf: &'a [u8], target: SocketAddr) -> SendFuture<'a>;

    /// Receive a datagram into `buf`, returning `(bytes_read, source_address)`.
    fn recv_from<'a>(&'a self, buf: &'a mut [u8]) -> RecvFuture<'a>;

    /// Return the local address this transport is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Default [`Transport`] over a `tokio::net::UdpSocket`.
pub struct UdpTransport {
    socket: tokio::net::UdpSocket,
}

impl UdpTransport {
    /// Bind a UDP socket on the loopback interface at `port`.
    pub async fn bind(port: u16) -> io::Result<Self> {
        let socket = tokio::net::UdpSocket::bind(("127.0.0.1", port)).await?;
        Ok(Self { socket })
    }

    /// Wrap an existing socket.
    pub fn new(socket: tokio::net::UdpSocket) -> Self {
        Self { socket }
    }
}

impl Transport for UdpTransport {
    fn send_to<'a>(&'a self, buf: &'a [u8], target: SocketAddr) -> SendFuture<'a> {
        Box::pin(self.socket.send_to(buf, target))
    }

    fn recv_from<'a>(&'a self, buf: &'a mut [u8]) -> RecvFuture<'a> {
        Box::pin(self.socket.recv_from(buf))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
