//! Datagram transport abstraction
//!
//! The dispatcher and broadcast engine only ever need two operations from the
//! network: wait for the next datagram and send one datagram to an address.
//! Keeping them behind a trait lets the same protocol logic run over a real
//! `tokio::net::UdpSocket` or an in-memory transport in tests.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Waits for the next datagram, returning its length and origin.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Sends one datagram. An error means the destination should be treated
    /// as gone.
    async fn send(&self, payload: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

#[async_trait]
impl Transport for UdpSocket {
    async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.recv_from(buf).await
    }

    async fn send(&self, payload: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.send_to(payload, addr).await
    }
}
