//! In-memory transport that records every datagram sent through it.
//!
//! # Purpose
//!
//! A real UDP socket needs a server on the other end and gives tests no way
//! to see exactly which bytes went out.  `RecordingTransport` replaces the
//! socket with a `Mutex<Vec<...>>` so assertions can inspect every outbound
//! datagram, in order, and pairs it with a plain `mpsc` sender through which
//! a test plays the server's side.
//!
//! # Usage in tests
//!
//! ```ignore
//! let (transport, server) = RecordingTransport::new();
//! let client = RconClient::with_transport(Arc::clone(&transport), server.inbound, config);
//!
//! let login = client.login();
//! server.tx.send(login_response(true)).await.unwrap();
//! assert!(login.await.unwrap());
//! assert_eq!(transport.sent().len(), 1);
//! ```
//!
//! # `should_fail` flag
//!
//! Call `set_failing(true)` to make every send return an I/O error, to
//! exercise error paths without a broken network.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rcon_core::decode_frame;
use tokio::sync::mpsc;

use crate::application::transport::Transport;

/// Capacity of the simulated inbound channel.
const SIMULATED_CHANNEL_CAPACITY: usize = 128;

/// The server side of a [`RecordingTransport`].
pub struct SimulatedServer {
    /// Push datagrams here to deliver them to the client.
    pub tx: mpsc::Sender<Vec<u8>>,
    /// Hand this to the client as its inbound channel.
    pub inbound: mpsc::Receiver<Vec<u8>>,
}

/// A transport that records outbound datagrams instead of sending them.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Vec<u8>>>,
    should_fail: AtomicBool,
}

impl RecordingTransport {
    /// Creates a transport and the channel pair that simulates the server.
    pub fn new() -> (Arc<Self>, SimulatedServer) {
        let (tx, inbound) = mpsc::channel(SIMULATED_CHANNEL_CAPACITY);
        (Arc::new(Self::default()), SimulatedServer { tx, inbound })
    }

    /// Every datagram sent so far, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The payloads of every datagram sent so far, with the frame header
    /// stripped.  Datagrams that are not valid frames are skipped.
    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.sent()
            .iter()
            .filter_map(|datagram| decode_frame(datagram).ok().map(<[u8]>::to_vec))
            .collect()
    }

    /// Number of datagrams sent so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// When `true`, every send fails with an I/O error and records nothing.
    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "recording transport set to fail",
            ));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(datagram.to_vec());
        Ok(())
    }
}
