//! Network infrastructure for the client application.
//!
//! `UdpTransport` implements the application's [`Transport`] trait over a
//! Tokio UDP socket; [`connect`] wires it to a new [`RconClient`].
//!
//! [`Transport`]: crate::application::transport::Transport

pub mod recording;
pub mod udp;

pub use recording::RecordingTransport;
pub use udp::UdpTransport;

use tracing::info;

use crate::application::client::{RconClient, RconConfig};
use crate::application::session::RconError;

/// Opens a UDP socket towards `config.host:config.port` and starts a session.
///
/// The returned client is not logged in yet; call [`RconClient::login`].
///
/// # Errors
///
/// Returns [`RconError::Resolve`] if the host cannot be resolved and
/// [`RconError::Io`] if the socket cannot be bound.
pub async fn connect(config: &RconConfig) -> Result<RconClient, RconError> {
    let (transport, inbound) = UdpTransport::bind(&config.host, config.port).await?;
    info!(server = %transport.server_addr(), "RCON transport ready");
    Ok(RconClient::with_transport(transport, inbound, config.clone()))
}
