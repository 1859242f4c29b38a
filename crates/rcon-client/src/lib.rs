//! rcon-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does rcon-client do?
//!
//! It speaks the UDP remote-console protocol to a game server:
//!
//! 1. Logs in with the server's RCON password.
//! 2. Sends console commands and hands each caller the response to *its*
//!    command, matched by sequence number and reassembled when the server
//!    splits it across several datagrams.
//! 3. Acknowledges and forwards the chat/log messages the server pushes.
//! 4. Sends a keepalive on a fixed interval and declares the session dead
//!    when one goes unanswered for a whole interval.
//!
//! ```no_run
//! # async fn demo() -> Result<(), rcon_client::RconError> {
//! use rcon_client::{connect, RconConfig};
//!
//! let client = connect(&RconConfig::new("127.0.0.1", 2306, "secret")).await?;
//! if client.login().await? {
//!     let players = client.send_command("players").await?;
//!     println!("{players}");
//! }
//! # Ok(())
//! # }
//! ```

/// Application layer: the session state machine and the client handle.
pub mod application;

/// Infrastructure layer: UDP transport, test transport, and configuration file.
pub mod infrastructure;

pub use application::client::{RconClient, RconConfig};
pub use application::session::{ConnectionState, DisconnectReason, RconError};
pub use application::transport::Transport;
pub use infrastructure::network::connect;
