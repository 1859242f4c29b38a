//! The outbound half of the datagram transport.
//!
//! The session only ever needs to send a datagram to the server it was
//! created for; inbound datagrams are delivered separately on a channel so
//! that the session task can wait on them alongside its timers.

use std::sync::Arc;

use async_trait::async_trait;

/// Sends datagrams to a single, fixed server.
///
/// Each infrastructure adapter (UDP socket, in-memory recorder) provides an
/// implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one datagram.
    async fn send(&self, datagram: &[u8]) -> std::io::Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, datagram: &[u8]) -> std::io::Result<()> {
        (**self).send(datagram).await
    }
}
