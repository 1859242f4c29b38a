//! Infrastructure layer for the RCON client.
//!
//! Contains the OS-facing adapters: the UDP socket transport and the
//! configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rcon_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – `UdpTransport`, which resolves the server address, binds
//!   an ephemeral UDP socket and feeds received datagrams into a channel, plus
//!   `RecordingTransport`, an in-memory transport that records every datagram
//!   sent through it.
//!
//! - **`storage`** – TOML configuration file loading for the `rcon-client`
//!   binary.

pub mod network;
pub mod storage;
