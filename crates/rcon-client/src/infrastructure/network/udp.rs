//! UDP socket transport.
//!
//! `UdpTransport::bind` resolves the server address, binds an ephemeral
//! local socket of the same address family, and `connect`s it to the server
//! so that the OS filters out datagrams from any other peer.
//!
//! A background task reads datagrams from the socket and forwards them on
//! an `mpsc` channel; the session task consumes that channel.  The reader
//! stops once the channel's receiver is dropped.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use crate::application::session::RconError;
use crate::application::transport::Transport;

/// Capacity of the inbound datagram channel.
pub const INBOUND_CHANNEL_CAPACITY: usize = 128;

/// Largest payload a UDP datagram can carry over IPv4.
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Pause after a receive error before reading again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A UDP socket connected to one RCON server.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    server_addr: SocketAddr,
}

impl UdpTransport {
    /// Binds a socket towards `host:port` and starts the receive loop.
    ///
    /// Returns the transport together with the channel on which datagrams
    /// from the server are delivered.
    ///
    /// # Errors
    ///
    /// Returns [`RconError::Resolve`] if `host` does not resolve and
    /// [`RconError::Io`] if binding or connecting the socket fails.
    pub async fn bind(
        host: &str,
        port: u16,
    ) -> Result<(Self, mpsc::Receiver<Vec<u8>>), RconError> {
        let server_addr = resolve(host, port).await?;
        let local_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local_addr).await?;
        socket.connect(server_addr).await?;
        debug!(local = ?socket.local_addr().ok(), %server_addr, "UDP socket bound");

        let socket = Arc::new(socket);
        let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        tokio::spawn(receive_loop(Arc::clone(&socket), tx));

        Ok((
            Self {
                socket,
                server_addr,
            },
            rx,
        ))
    }

    /// The server this transport sends to.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        self.socket.send(datagram).await.map(|_| ())
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, RconError> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|e| RconError::Resolve(format!("{host}:{port} ({e})")))?;
    addrs
        .next()
        .ok_or_else(|| RconError::Resolve(format!("{host}:{port}")))
}

/// Forwards datagrams from `socket` to `tx` until the receiver is dropped.
async fn receive_loop(socket: Arc<UdpSocket>, tx: mpsc::Sender<Vec<u8>>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            _ = tx.closed() => break,
            result = socket.recv(&mut buf) => match result {
                Ok(len) => {
                    if tx.send(buf[..len].to_vec()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    // ICMP port-unreachable surfaces here on some platforms.
                    warn!("UDP receive error: {e}");
                    time::sleep(RECV_ERROR_BACKOFF).await;
                }
            },
        }
    }

    debug!("UDP receive loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
