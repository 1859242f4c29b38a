//! Application layer for the RCON client.
//!
//! - **`transport`** – the `Transport` trait the session sends datagrams
//!   through.  Implementations live in the infrastructure layer.
//! - **`events`** – subscriber registries for server messages and disconnects.
//! - **`session`** – the connection state machine: login, commands,
//!   keepalive liveness, and inbound dispatch.
//! - **`client`** – the cloneable `RconClient` handle and the task that
//!   drives a `Session` from requests, datagrams, and timers.

pub mod client;
pub mod events;
pub mod session;
pub mod transport;
